//! Hash engines: deriving `k` partition positions from an item via double
//! hashing, plus the process-wide registry of custom hash ids.
//!
//! Three built-in engines (201, 202, 203) cover every `b` in `[6, 48]`; ids
//! `0..=200` are reserved for caller-registered engines looked up through
//! [`register`]/[`get`]. Ids `204..=255` are reserved and never resolve.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// A hash engine turns an item's byte representation plus `(k, b)` into the
/// `k` partition positions, each in `[0, 2^b)`.
///
/// This is the "straight-line routine" framing permitted by the design
/// notes: rather than threading accumulators through per-step closures, an
/// engine computes all `k` positions in one call. Callers only require
/// that the resulting positions match; how they're produced internally is
/// not part of the wire contract except for the three frozen default ids.
pub type HashEngine = Arc<dyn Fn(&[u8], u8, u8) -> Vec<u64> + Send + Sync>;

static REGISTRY: Lazy<RwLock<HashMap<u8, HashEngine>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a custom hash engine under `id`. Overwrites any prior
/// registration for the same id.
pub fn register(id: u8, engine: HashEngine) -> Result<()> {
    if id > 200 {
        return Err(Error::InvalidParameters(
            "custom hash id must be in [0, 200]",
        ));
    }
    REGISTRY
        .write()
        .expect("hash registry lock poisoned")
        .insert(id, engine);
    Ok(())
}

/// Resolve a hash id to its engine: the three built-ins for 201/202/203, or
/// a lookup into the custom registry for `0..=200`. Ids `204..=255` never
/// resolve.
pub fn get(id: u8) -> Result<HashEngine> {
    match id {
        201 => Ok(Arc::new(engine_201)),
        202 => Ok(Arc::new(engine_202)),
        203 => Ok(Arc::new(engine_203)),
        0..=200 => REGISTRY
            .read()
            .expect("hash registry lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownHashId(id)),
        _ => Err(Error::UnknownHashId(id)),
    }
}

const DOMAIN_BARE: u8 = 0;
const DOMAIN_LIST: u8 = 1;
const DOMAIN_TUPLE: u8 = 2;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a_32(domain: u8, item: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    hash ^= domain as u32;
    hash = hash.wrapping_mul(FNV_PRIME);
    for &byte in item {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// `H32(x, range)`: a 32-bit non-cryptographic hash of `item` reduced into
/// `[0, range)`. Uses Lemire's multiply-shift reduction instead of modulo
/// so that `range` need not be a power of two.
fn h32(domain: u8, item: &[u8], range: u64) -> u32 {
    debug_assert!(range > 0 && range <= (1u64 << 32));
    let hash = fnv1a_32(domain, item);
    if range == 1u64 << 32 {
        return hash;
    }
    ((hash as u64 * range) >> 32) as u32
}

fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Engine 201 (`b <= 16`): one 32-bit hash split into two non-overlapping
/// `b`-bit halves.
fn engine_201(item: &[u8], k: u8, b: u8) -> Vec<u64> {
    let h = h32(DOMAIN_BARE, item, 1u64 << 32) as u64;
    let h1 = (h >> (32 - b as u32)) & mask(b);
    let h2 = (h >> (32 - 2 * b as u32)) & mask(b);
    let m = 1u64 << b;
    (0..k as u64)
        .map(|i| if i == 0 { h1 } else { (h1 + i * h2) % m })
        .collect()
}

/// Engine 202 (`16 < b <= 32`): `h1` and `h2` are each independently
/// reduced into `[0, m)`, with `h2` hashed over the single-element "list"
/// wrapper domain so it is independent of `h1` even for identical bytes.
fn engine_202(item: &[u8], k: u8, b: u8) -> Vec<u64> {
    let m = 1u64 << b;
    let h1 = h32(DOMAIN_BARE, item, m) as u64;
    let h2 = h32(DOMAIN_LIST, item, m) as u64;
    (0..k as u64)
        .map(|i| match i {
            0 => h1,
            _ => (h1 + i * h2) % m,
        })
        .collect()
}

/// Engine 203 (`32 < b <= 48`): three 32-bit hashes over distinct domain
/// tags (bare, list, tuple) are concatenated big-endian into a 96-bit
/// value; `h1` and `h2` are adjacent `b`-bit windows into that value, which
/// may straddle the boundary between any two of the three 32-bit words.
fn engine_203(item: &[u8], k: u8, b: u8) -> Vec<u64> {
    let first = h32(DOMAIN_BARE, item, 1u64 << 32) as u128;
    let second = h32(DOMAIN_LIST, item, 1u64 << 32) as u128;
    let third = h32(DOMAIN_TUPLE, item, 1u64 << 32) as u128;
    let combined: u128 = (first << 64) | (second << 32) | third;

    let b = b as u32;
    let m = 1u64 << b;
    let mask128 = (1u128 << b) - 1;
    let h1 = ((combined >> (96 - b)) & mask128) as u64;
    let h2 = ((combined >> (96 - 2 * b)) & mask128) as u64;

    (0..k as u64)
        .map(|i| match i {
            0 => h1,
            1 => (h1 + h2) % m,
            _ => (h1 + i * h2) % m,
        })
        .collect()
}
