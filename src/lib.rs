//! A fixed-capacity partitioned Bloom filter with a bit-exact, directly
//! queryable wire format.
//!
//! The bit array is split into `k` equal partitions, one per hash function,
//! each covering `2^b` bits. Insertion and membership set or test one bit
//! per partition via double hashing; the live representation ([`Filter`])
//! backs its words with `AtomicU64` so concurrent callers never need an
//! external lock. The encoded representation ([`Encoded`]) can answer
//! `member` queries directly against a byte slice, without first building a
//! live filter.
//!
//! ```
//! use partbloom::Filter;
//!
//! let f = Filter::new(1000, 0.01).unwrap();
//! f.put(b"hello");
//! assert!(f.member(b"hello"));
//! assert!(!f.member(b"goodbye"));
//! ```

mod atomic;
mod bitpos;
mod encoded;
mod error;
mod estimate;
mod filter;
mod hash;
pub mod sizing;
pub mod wire;
mod word_source;

pub use encoded::Encoded;
pub use error::{Error, Result};
pub use filter::Filter;
pub use hash::{register, HashEngine};
pub use sizing::Params;
pub use word_source::{check_compatible, WordSource};
