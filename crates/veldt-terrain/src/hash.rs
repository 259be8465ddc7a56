//! Seeded integer lattice hashing.
//!
//! Every other sampler in this crate (and the feature placement code built on
//! top of it) derives its pseudo-randomness from this one avalanching mix, so
//! identical `(seed, coordinate, salt)` inputs always reproduce identical
//! samples with no shared state between threads.

/// Hash a 2D integer lattice coordinate under a seed and a purpose salt.
///
/// Distinct salts yield decorrelated streams for the same coordinate, which
/// is how height noise, biome jitter, and per-feature-category draws stay
/// independent while sharing one world seed.
#[inline]
pub fn lattice_hash(seed: u32, x: i32, z: i32, salt: u32) -> u32 {
    let mut h = seed ^ salt;
    h ^= (x as u32).wrapping_mul(0x27d4_eb2d);
    h ^= (z as u32).wrapping_mul(0x1656_67b1);
    h = h.rotate_left(13);
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 16;
    h
}

/// Draw a deterministic sample in `[0, 1]` from the low 16 bits of the hash.
#[inline]
pub fn unit_sample(seed: u32, x: i32, z: i32, salt: u32) -> f32 {
    (lattice_hash(seed, x, z, salt) & 0xffff) as f32 / 65535.0
}
