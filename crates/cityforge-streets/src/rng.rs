//! Deterministic random streams keyed by strings and positions.
//!
//! Every stream is a `ChaCha8Rng` seeded through xxh64, so a cluster seed or
//! a quarter position always yields the same sequence on every platform.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use xxhash_rust::xxh64::xxh64;

/// Stable 64-bit seed for a string key.
pub fn seed_from_key(key: &str) -> u64 {
    xxh64(key.as_bytes(), 0)
}

pub fn rng_from_key(key: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed_from_key(key))
}

/// Stream for a quarter, keyed by its centre snapped to a `quantum` grid.
///
/// Snapping keeps the stream stable under float noise in the traced polygon.
pub fn quarter_rng(center: Vec2, quantum: f32) -> ChaCha8Rng {
    let q = quantum.max(f32::EPSILON);
    let x = (center.x / q).round() as i64;
    let y = (center.y / q).round() as i64;
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&x.to_le_bytes());
    bytes[8..].copy_from_slice(&y.to_le_bytes());
    ChaCha8Rng::seed_from_u64(xxh64(&bytes, 0x5eed))
}
