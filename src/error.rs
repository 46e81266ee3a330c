use thiserror::Error;

/// Caller-facing failure modes for every operation in this crate.
///
/// All variants are fatal: they surface immediately and are never retried by
/// the library. Internal compare-and-swap retries inside the atomic set-bit
/// protocol are invisible here; they always terminate in success and never
/// produce an `Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),

    #[error("capacity/fpp combination requires more than 48 bits per partition")]
    UnsupportedCapacity,

    #[error("unknown hash id: {0}")]
    UnknownHashId(u8),

    #[error("incompatible filters: expected (hash_id={expected_hash_id}, k={expected_k}, b={expected_b}), found (hash_id={found_hash_id}, k={found_k}, b={found_b})")]
    IncompatibleFilters {
        expected_hash_id: u8,
        expected_k: u8,
        expected_b: u8,
        found_hash_id: u8,
        found_k: u8,
        found_b: u8,
    },

    #[error("malformed binary: {0}")]
    MalformedBinary(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
