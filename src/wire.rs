//! The 3-byte header shared by every encoded blob, and the length
//! arithmetic that ties `(k, b)` to the expected blob size.

use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 3;

/// Total words in the word array for a filter shaped `(k, b)`.
///
/// # Examples
///
/// ```
/// use partbloom::wire::size_for;
///
/// assert_eq!(size_for(1, 6), 1);   // one partition, 64 bits -> one word
/// assert_eq!(size_for(7, 11), 224); // k=7, m=2048 -> 7*2048/64 words
/// ```
pub fn size_for(k: u8, b: u8) -> u64 {
    (k as u64 * (1u64 << b)) / 64
}

/// Total encoded length in bytes for a filter shaped `(k, b)`.
pub fn encoded_len_for(k: u8, b: u8) -> u64 {
    HEADER_LEN as u64 + 8 * size_for(k, b)
}

/// Parsed, length-validated header: `(hash_id, k, b, size)`.
///
/// # Examples
///
/// ```
/// use partbloom::wire::parse_header;
///
/// let mut bin = vec![201u8, 1, 6];
/// bin.extend_from_slice(&[0u8; 8]);
/// assert_eq!(parse_header(&bin).unwrap(), (201, 1, 6, 1));
///
/// assert!(parse_header(&[201, 1]).is_err()); // shorter than the header
/// ```
pub fn parse_header(bin: &[u8]) -> Result<(u8, u8, u8, usize)> {
    if bin.len() < HEADER_LEN {
        return Err(Error::MalformedBinary("blob shorter than the 3-byte header"));
    }
    let hash_id = bin[0];
    let k = bin[1];
    let b = bin[2];

    if !(6..=48).contains(&b) {
        return Err(Error::MalformedBinary("b must be in [6, 48]"));
    }
    if k == 0 {
        return Err(Error::MalformedBinary("k must be positive"));
    }

    let size = size_for(k, b);
    let expected_len = encoded_len_for(k, b);
    if bin.len() as u64 != expected_len {
        return Err(Error::MalformedBinary(
            "blob length does not match 3 + 8*(k*2^b/64)",
        ));
    }

    Ok((hash_id, k, b, size as usize))
}
