//! Cardinality and capacity estimators.
//!
//! Each partition is, on its own, a single-hash Bloom filter over `m` bits;
//! scanning the last partition alone is enough to estimate how many items
//! went into the whole filter, at 1/k the cost of a full scan.

/// `estimate_size` from a partition's popcount `x` out of `m` bits.
pub fn size_from_popcount(x: u64, b: u8) -> u64 {
    let m = (1u64 << b) as f64;
    let x = x as f64;
    let estimate = if x < m {
        -m * (1.0 - x / m).ln()
    } else {
        -m * (1.0 / m).ln()
    };
    estimate.round() as u64
}

/// `estimate_capacity`: the capacity at which a single `m`-bit partition is
/// expected to be half full.
pub fn capacity(b: u8) -> u64 {
    let m = (1u64 << b) as f64;
    (0.5f64.ln() / (1.0 - 1.0 / m).ln()).round() as u64
}
