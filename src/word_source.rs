//! Unified read access to a filter's word array regardless of whether it is
//! backed by atomics (live) or a byte slice (encoded). `merge`,
//! `merge_into`, and `merge_encode` operate purely in terms of this trait so
//! they can consume any mix of live and encoded inputs.

use crate::error::{Error, Result};

pub trait WordSource {
    fn hash_id(&self) -> u8;
    fn k(&self) -> u8;
    fn b(&self) -> u8;
    fn size(&self) -> usize;

    /// Word `w` (0-based) of the word array, independent of storage.
    fn word(&self, w: usize) -> u64;
}

/// Confirm every input shares `(hash_id, k, b)`, returning that shape.
/// Fails with `IncompatibleFilters` against the first disagreement found,
/// reporting it relative to the first input in the list.
pub fn check_compatible<'a>(inputs: &[&'a dyn WordSource]) -> Result<(u8, u8, u8)> {
    let first = inputs
        .first()
        .ok_or(Error::InvalidParameters("merge requires at least one input"))?;
    let shape = (first.hash_id(), first.k(), first.b());

    for input in inputs.iter().skip(1) {
        let found = (input.hash_id(), input.k(), input.b());
        if found != shape {
            return Err(Error::IncompatibleFilters {
                expected_hash_id: shape.0,
                expected_k: shape.1,
                expected_b: shape.2,
                found_hash_id: found.0,
                found_k: found.1,
                found_b: found.2,
            });
        }
    }

    Ok(shape)
}
