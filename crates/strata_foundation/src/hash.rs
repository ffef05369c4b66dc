//! Hashing helpers for canonical id-set and query hashes.
//!
//! These produce stable 64-bit hashes independent of the standard library's
//! randomized hasher state, so shape hashes and query lookup hashes compare
//! equal across worlds within one build.

use crate::ident::Ident;

/// Folds `value` into `seed`.
///
/// Golden-ratio combine; order-sensitive, so callers hash sorted views.
#[must_use]
pub const fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ (value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2))
}

/// Finalizes a combined hash (splitmix64 mixer).
#[must_use]
pub const fn mix_hash(mut h: u64) -> u64 {
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Hashes a sorted id-set into its canonical shape hash.
///
/// The input must be sorted; two archetypes have the same shape hash exactly
/// when they have equal id-sets (modulo 64-bit collisions, which the graph
/// resolves by exact comparison).
#[must_use]
pub fn shape_hash(ids: &[Ident]) -> u64 {
    debug_assert!(ids.is_sorted(), "shape hash requires a sorted id-set");
    let mut h = 0u64;
    for id in ids {
        h = hash_combine(h, id.value());
    }
    mix_hash(hash_combine(h, ids.len() as u64))
}
