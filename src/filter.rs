//! The live, mutable filter: an atomic word array plus the shape
//! (`hash_id`, `k`, `b`) needed to interpret it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::atomic::atomic_or;
use crate::bitpos::locate;
use crate::encoded::Encoded;
use crate::error::{Error, Result};
use crate::estimate;
use crate::hash::{self, HashEngine};
use crate::sizing;
use crate::wire::{self, HEADER_LEN};
use crate::word_source::{check_compatible, WordSource};

/// A live partitioned Bloom filter over a shared atomic word array.
///
/// Bits only ever transition `0 -> 1`; there is no way to clear one. All
/// methods take `&self` because every mutation goes through the atomic
/// set-bit protocol; concurrent `put`/`member` calls from multiple threads
/// are safe without any external locking.
pub struct Filter {
    hash_id: u8,
    k: u8,
    b: u8,
    words: Vec<AtomicU64>,
}

impl Filter {
    /// Size a filter for `capacity` items at false-positive rate `fpp`,
    /// using the default hash engine for the resulting `b`.
    pub fn new(capacity: u64, fpp: f64) -> Result<Self> {
        let params = sizing::compute(capacity, fpp)?;
        Ok(Self::from_params(params.hash_id, params.k, params.b))
    }

    /// As [`Filter::new`], but with a caller-registered hash engine.
    /// `hash_id` must already be registered via [`crate::hash::register`].
    pub fn new_with_hash(capacity: u64, fpp: f64, hash_id: u8) -> Result<Self> {
        if hash_id > 200 {
            return Err(Error::InvalidParameters(
                "explicit hash id must be in [0, 200]",
            ));
        }
        let params = sizing::compute(capacity, fpp)?;
        hash::get(hash_id)?;
        Ok(Self::from_params(hash_id, params.k, params.b))
    }

    fn from_params(hash_id: u8, k: u8, b: u8) -> Self {
        let size = wire::size_for(k, b) as usize;
        let words = (0..size).map(|_| AtomicU64::new(0)).collect();
        Self {
            hash_id,
            k,
            b,
            words,
        }
    }

    pub fn hash_id(&self) -> u8 {
        self.hash_id
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    pub fn b(&self) -> u8 {
        self.b
    }

    /// Number of words backing the filter, `(k*2^b)/64`.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// `true` if no bit has ever been set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.load(Ordering::Acquire) == 0)
    }

    fn engine(&self) -> Result<HashEngine> {
        hash::get(self.hash_id)
    }

    /// Insert `item`. Monotone: only ever transitions bits `0 -> 1`.
    pub fn put(&self, item: &[u8]) {
        let engine = self.engine().expect("filter holds a resolvable hash_id");
        let positions = engine(item, self.k, self.b);
        for (j, position) in positions.into_iter().enumerate() {
            let (word, offset) = locate(j as u32, self.b, position);
            atomic_or(&self.words[word], 1u64 << offset);
        }
    }

    /// `true` if `item` was (probably) inserted; never a false negative.
    pub fn member(&self, item: &[u8]) -> bool {
        let engine = self.engine().expect("filter holds a resolvable hash_id");
        let positions = engine(item, self.k, self.b);
        for (j, position) in positions.into_iter().enumerate() {
            let (word, offset) = locate(j as u32, self.b, position);
            if self.words[word].load(Ordering::Acquire) >> offset & 1 == 0 {
                return false;
            }
        }
        true
    }

    /// Serialize to the wire format: 3-byte header followed by the words in
    /// reverse order, each big-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 8 * self.words.len());
        out.push(self.hash_id);
        out.push(self.k);
        out.push(self.b);
        for word in self.words.iter().rev() {
            out.extend_from_slice(&word.load(Ordering::Acquire).to_be_bytes());
        }
        out
    }

    /// Parse an encoded blob into a live filter, bitwise equivalent to the
    /// filter that produced it.
    pub fn decode(bin: &[u8]) -> Result<Self> {
        let view = Encoded::parse(bin)?;
        let words = (0..view.size()).map(|w| AtomicU64::new(view.word(w))).collect();
        Ok(Self {
            hash_id: view.hash_id(),
            k: view.k(),
            b: view.b(),
            words,
        })
    }

    fn last_partition_popcount(&self) -> u64 {
        let words_per_partition = (1u64 << self.b) / 64;
        let start = self.words.len() as u64 - words_per_partition;
        self.words[start as usize..]
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as u64)
            .sum()
    }

    pub fn estimate_size(&self) -> u64 {
        estimate::size_from_popcount(self.last_partition_popcount(), self.b)
    }

    pub fn estimate_capacity(&self) -> u64 {
        estimate::capacity(self.b)
    }

    pub fn estimate_memory(&self) -> usize {
        self.words.len() * 8
    }

    /// Combine every input's words with OR into a fresh filter. Inputs may
    /// mix live and encoded representations but must share `(hash_id, k, b)`.
    pub fn merge(inputs: &[&dyn WordSource]) -> Result<Self> {
        let (hash_id, k, b) = check_compatible(inputs)?;
        let dest = Self::from_params(hash_id, k, b);
        for (w, word) in dest.words.iter().enumerate() {
            let combined = inputs.iter().fold(0u64, |acc, input| acc | input.word(w));
            word.store(combined, Ordering::Release);
        }
        Ok(dest)
    }

    /// OR every input's words into `dest` in place, through the atomic
    /// set-bit protocol so concurrent `put`/`member` on `dest` stay safe.
    pub fn merge_into(inputs: &[&dyn WordSource], dest: &Filter) -> Result<()> {
        let dest_source: &dyn WordSource = dest;
        let mut all = Vec::with_capacity(inputs.len() + 1);
        all.push(dest_source);
        all.extend_from_slice(inputs);
        check_compatible(&all)?;

        for (w, word) in dest.words.iter().enumerate() {
            let combined = inputs.iter().fold(0u64, |acc, input| acc | input.word(w));
            atomic_or(word, combined);
        }
        Ok(())
    }

    /// Equivalent to `encode(merge(inputs))`, without materializing the
    /// intermediate live filter: each output word is computed and written
    /// directly in reverse order as it's produced.
    pub fn merge_encode(inputs: &[&dyn WordSource]) -> Result<Vec<u8>> {
        let (hash_id, k, b) = check_compatible(inputs)?;
        let size = wire::size_for(k, b) as usize;

        let mut out = Vec::with_capacity(HEADER_LEN + 8 * size);
        out.push(hash_id);
        out.push(k);
        out.push(b);
        for w in (0..size).rev() {
            let combined = inputs.iter().fold(0u64, |acc, input| acc | input.word(w));
            out.extend_from_slice(&combined.to_be_bytes());
        }
        Ok(out)
    }
}

impl WordSource for Filter {
    fn hash_id(&self) -> u8 {
        self.hash_id
    }

    fn k(&self) -> u8 {
        self.k
    }

    fn b(&self) -> u8 {
        self.b
    }

    fn size(&self) -> usize {
        self.words.len()
    }

    fn word(&self, w: usize) -> u64 {
        self.words[w].load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("hash_id", &self.hash_id)
            .field("k", &self.k)
            .field("b", &self.b)
            .field("words", &self.words.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn put_then_member_is_true() {
        let f = Filter::new(1000, 0.01).unwrap();
        f.put(b"hello");
        assert!(f.member(b"hello"));
        assert!(!f.member(b"ok"));
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let f = Filter::new(1000, 0.02).unwrap();
        f.put(b"hello");
        f.put(b"world");

        let bin = f.encode();
        assert!(Encoded::parse(&bin).unwrap().member(b"hello").unwrap());
        assert!(Encoded::parse(&bin).unwrap().member(b"world").unwrap());
        assert!(!Encoded::parse(&bin).unwrap().member(b"abcde").unwrap());

        let decoded = Filter::decode(&bin).unwrap();
        assert!(decoded.member(b"hello"));
        assert!(decoded.member(b"world"));
        assert_eq!(decoded.encode(), bin);
    }

    #[test]
    fn tiny_filter_matches_worked_example() {
        // new(40, 0.5) -> header [201, 1, 6] plus one zero word.
        let f = Filter::new(40, 0.5).unwrap();
        assert_eq!(
            f.encode(),
            vec![201, 1, 6, 0, 0, 0, 0, 0, 0, 0, 0]
        );

        f.put(b"hello");
        let bin = f.encode();
        assert_eq!(bin.len(), 11);
        assert_ne!(&bin[3..], &[0u8; 8]); // exactly one word, now non-zero
    }

    #[test]
    fn estimate_size_tracks_insertions() {
        let f = Filter::new(1000, 0.01).unwrap();
        assert_eq!(f.estimate_size(), 0);

        for i in 0u32..6 {
            f.put(&i.to_be_bytes());
        }
        assert_eq!(f.estimate_size(), 6);

        for i in 6u32..1000 {
            f.put(&i.to_be_bytes());
        }
        let estimate = f.estimate_size();
        assert!((950..=1050).contains(&estimate), "estimate was {estimate}");
    }

    #[test]
    fn merge_combines_two_filters() {
        let b1 = Filter::new(1000, 0.05).unwrap();
        let b2 = Filter::new(1000, 0.05).unwrap();
        b1.put(b"hello");
        b2.put(b"world");

        let sources: Vec<&dyn WordSource> = vec![&b1, &b2];
        let merged = Filter::merge(&sources).unwrap();
        assert!(merged.member(b"hello"));
        assert!(merged.member(b"world"));
        assert!(!merged.member(b"abcde"));
    }

    #[test]
    fn merge_rejects_incompatible_shapes() {
        let a = Filter::new(1000, 0.05).unwrap();
        let b = Filter::new(1000, 0.5).unwrap(); // different k/b
        let sources: Vec<&dyn WordSource> = vec![&a, &b];
        assert!(matches!(
            Filter::merge(&sources),
            Err(Error::IncompatibleFilters { .. })
        ));
    }

    #[test]
    fn merge_encode_matches_encode_of_merge() {
        let b1 = Filter::new(1000, 0.05).unwrap();
        let b2 = Filter::new(1000, 0.05).unwrap();
        b1.put(b"hello");
        b2.put(b"world");

        let sources: Vec<&dyn WordSource> = vec![&b1, &b2];
        let merged = Filter::merge(&sources).unwrap();
        let streamed = Filter::merge_encode(&sources).unwrap();
        assert_eq!(merged.encode(), streamed);
    }

    #[test]
    fn merge_into_matches_merge_with_prior_dest_state() {
        let b1 = Filter::new(1000, 0.05).unwrap();
        let b2 = Filter::new(1000, 0.05).unwrap();
        b1.put(b"hello");
        b2.put(b"world");

        let dest = Filter::new(1000, 0.05).unwrap();
        dest.put(b"preexisting");
        let dest_snapshot = dest.encode();

        let sources: Vec<&dyn WordSource> = vec![&b1, &b2];
        Filter::merge_into(&sources, &dest).unwrap();

        let dest_before = Filter::decode(&dest_snapshot).unwrap();
        let dest_before_ref: &dyn WordSource = &dest_before;
        let mut all = vec![dest_before_ref];
        all.extend_from_slice(&sources);
        let expected = Filter::merge(&all).unwrap();

        assert_eq!(dest.encode(), expected.encode());
    }

    #[test]
    fn concurrent_puts_from_many_threads_are_all_observed() {
        let f = Filter::new(10_000, 0.01).unwrap();
        let f = &f;
        thread::scope(|scope| {
            for t in 0..8u32 {
                scope.spawn(move || {
                    for i in 0..500u32 {
                        f.put(&(t * 10_000 + i).to_be_bytes());
                    }
                });
            }
        });

        for t in 0..8u32 {
            for i in 0..500u32 {
                let key = (t * 10_000 + i).to_be_bytes();
                assert!(f.member(&key), "key {t}-{i} should be present");
            }
        }
    }

    #[test]
    fn false_positive_rate_is_reasonably_close_to_target() {
        let fpp = 0.01;
        let n = 2000u64;
        let f = Filter::new(n, fpp).unwrap();
        for i in 0..n as u32 {
            f.put(&i.to_be_bytes());
        }

        let probes = 10 * n as u32;
        let mut false_positives = 0u64;
        for i in (n as u32)..(n as u32 + probes) {
            if f.member(&i.to_be_bytes()) {
                false_positives += 1;
            }
        }

        let rate = false_positives as f64 / probes as f64;
        assert!(rate <= fpp * 1.5, "observed fp rate {rate} too high for target {fpp}");
    }
}
