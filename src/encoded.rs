//! The encoded ("binary") representation: an immutable byte slice that
//! supports membership queries and estimators directly, without building a
//! live [`crate::Filter`].

use crate::bitpos::locate;
use crate::error::Result;
use crate::hash;
use crate::word_source::WordSource;
use crate::wire::{self, HEADER_LEN};

/// A parsed, length-validated view over an encoded blob. Borrows its input;
/// never copies the word data.
#[derive(Debug, Clone, Copy)]
pub struct Encoded<'a> {
    bin: &'a [u8],
    hash_id: u8,
    k: u8,
    b: u8,
    size: usize,
}

impl<'a> Encoded<'a> {
    /// Parse and validate `bin`'s header and length. Does not touch the
    /// hash registry; that only happens when [`Encoded::member`] is called.
    pub fn parse(bin: &'a [u8]) -> Result<Self> {
        let (hash_id, k, b, size) = wire::parse_header(bin)?;
        Ok(Self {
            bin,
            hash_id,
            k,
            b,
            size,
        })
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

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bin
    }

    /// Word `w` (0-based, live-array numbering). The encoded stream stores
    /// words in the reverse order, so live word `w` is stream word
    /// `size-1-w`.
    fn word_at(&self, w: usize) -> u64 {
        let stream_index = self.size - 1 - w;
        let offset = HEADER_LEN + stream_index * 8;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bin[offset..offset + 8]);
        u64::from_be_bytes(buf)
    }

    fn bit(&self, j: u32, position: u64) -> bool {
        let (word, offset) = locate(j, self.b, position);
        (self.word_at(word) >> offset) & 1 == 1
    }

    /// Membership test against an encoded blob. Resolves `hash_id`
    /// through the same registry `put`/`member` use on a live filter.
    pub fn member(&self, item: &[u8]) -> Result<bool> {
        let engine = hash::get(self.hash_id)?;
        let positions = engine(item, self.k, self.b);
        for (j, position) in positions.into_iter().enumerate() {
            if !self.bit(j as u32, position) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Popcount of the last partition's words only.
    fn last_partition_popcount(&self) -> u64 {
        let words_per_partition = (1u64 << self.b) / 64;
        let start = self.size as u64 - words_per_partition;
        (start..self.size as u64)
            .map(|w| self.word_at(w as usize).count_ones() as u64)
            .sum()
    }

    pub fn estimate_size(&self) -> u64 {
        crate::estimate::size_from_popcount(self.last_partition_popcount(), self.b)
    }

    pub fn estimate_capacity(&self) -> u64 {
        crate::estimate::capacity(self.b)
    }

    pub fn estimate_memory(&self) -> usize {
        self.bin.len()
    }
}

impl<'a> WordSource for Encoded<'a> {
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
        self.size
    }

    fn word(&self, w: usize) -> u64 {
        self.word_at(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn member_matches_live_filter_after_encode() {
        let f = Filter::new(1000, 0.01).unwrap();
        f.put(b"hello");
        f.put(b"world");
        let bin = f.encode();
        let view = Encoded::parse(&bin).unwrap();

        assert!(view.member(b"hello").unwrap());
        assert!(view.member(b"world").unwrap());
        assert!(f.member(b"hello"));
        assert!(f.member(b"world"));
    }

    #[test]
    fn rejects_truncated_blob() {
        let f = Filter::new(1000, 0.01).unwrap();
        let bin = f.encode();
        assert!(Encoded::parse(&bin[..bin.len() - 1]).is_err());
    }
}
