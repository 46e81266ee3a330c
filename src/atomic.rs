//! The atomic set-bit protocol: load, short-circuit if the bits
//! are already set, otherwise compare-and-swap in a retry loop. Works for a
//! single-bit mask (`put`) and a multi-bit mask (`merge_into`'s per-word
//! OR) identically, since OR-ing in a mask is idempotent and monotone
//! either way.

use std::sync::atomic::{AtomicU64, Ordering};

/// OR `mask` into `word`, retrying on CAS contention. Guaranteed to
/// terminate: every competing writer can only add bits, and there are at
/// most 64 of them, so the loop does bounded work even under contention.
pub fn atomic_or(word: &AtomicU64, mask: u64) {
    if mask == 0 {
        return;
    }
    let mut current = word.load(Ordering::Acquire);
    loop {
        if current | mask == current {
            return;
        }
        match word.compare_exchange_weak(
            current,
            current | mask,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}
