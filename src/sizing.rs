//! Turns a `(capacity, false-positive rate)` pair into the integer shape of
//! a filter: hash count `k`, bits-per-partition exponent `b`, and the
//! default hash engine for that `b`.

use crate::error::{Error, Result};

/// Shape of a filter derived from `(capacity, fpp)`, independent of any
/// concrete storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub k: u8,
    pub b: u8,
    pub hash_id: u8,
}

impl Params {
    /// Bits per partition, `2^b`.
    pub fn m(&self) -> u64 {
        1u64 << self.b
    }

    /// Total words in the live/encoded representation, `(k*m)/64`.
    pub fn size(&self) -> u64 {
        (self.k as u64 * self.m()) / 64
    }
}

/// Default hash engine id for a given `b`, per the engine table in the wire
/// table. `b` must already be validated to be in `[6, 48]`.
pub fn default_hash_id(b: u8) -> Result<u8> {
    match b {
        0..=16 => Ok(201),
        17..=32 => Ok(202),
        33..=48 => Ok(203),
        _ => Err(Error::UnsupportedCapacity),
    }
}

/// Compute `k` and `b` for `new(capacity, fpp)`, selecting the default hash
/// engine. Does not touch the hash registry; explicit custom hash ids are
/// validated and resolved by the caller.
///
/// # Examples
///
/// ```
/// use partbloom::sizing::compute;
///
/// let params = compute(40, 0.5).unwrap();
/// assert_eq!((params.k, params.b, params.hash_id), (1, 6, 201));
///
/// assert!(compute(0, 0.1).is_err()); // capacity must be positive
/// ```
pub fn compute(capacity: u64, fpp: f64) -> Result<Params> {
    if capacity == 0 {
        return Err(Error::InvalidParameters("capacity must be greater than zero"));
    }
    if !(fpp > 0.0 && fpp < 1.0) {
        return Err(Error::InvalidParameters("fpp must be in (0, 1)"));
    }

    let k_f = (-fpp.log2()).ceil();
    if !k_f.is_finite() || k_f < 1.0 || k_f > 255.0 {
        return Err(Error::InvalidParameters("fpp is too small or too large to size a filter"));
    }
    let k = k_f as u8;

    let p_prime = fpp.powf(1.0 / k_f);
    let m_f = 1.0 / (1.0 - (1.0 - p_prime).powf(1.0 / capacity as f64));
    if !m_f.is_finite() || m_f <= 0.0 {
        return Err(Error::InvalidParameters("capacity/fpp combination does not yield a finite partition size"));
    }

    let b = (m_f.log2().ceil() as i32).max(6);
    if b > 48 {
        return Err(Error::UnsupportedCapacity);
    }
    let b = b as u8;
    let hash_id = default_hash_id(b)?;

    Ok(Params { k, b, hash_id })
}
