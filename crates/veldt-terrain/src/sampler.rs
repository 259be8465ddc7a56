//! The combined terrain sampler: biome-weighted blending of per-kind fBm
//! heightfields.

use crate::biome::{BiomeField, BiomeKind, BiomeSample};
use crate::gradient::GradientNoise;

/// Octave count shared by every biome's heightfield.
const OCTAVES: u32 = 5;
/// Frequency multiplier between octaves.
const LACUNARITY: f32 = 2.0;
/// Amplitude multiplier between octaves.
const GAIN: f32 = 0.5;
/// Mixed into the world seed so the biome lattice decorrelates from the
/// height lattice.
const BIOME_SEED_MIX: u32 = 0x5f37_59df;
/// Biome cell edge length in world units.
const BIOME_CELL_SIZE: f32 = 256.0;

/// Pure height/biome sampler bound to a world seed.
///
/// Every field is an immutable copy of seed-derived state, so values can be
/// cloned into worker closures and sampled concurrently with no locking and
/// no possibility of cross-thread interference.
#[derive(Clone, Debug)]
pub struct TerrainSampler {
    seed: u32,
    noise: GradientNoise,
    biomes: BiomeField,
}

impl TerrainSampler {
    /// Create a sampler for the given world seed.
    pub fn new(seed: i32) -> Self {
        let seed = seed as u32;
        Self {
            seed,
            noise: GradientNoise::new(seed),
            biomes: BiomeField::new(seed ^ BIOME_SEED_MIX, BIOME_CELL_SIZE),
        }
    }

    /// The raw world seed, for salt-based draws layered on top of this
    /// sampler (feature placement).
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Terrain surface height at a world coordinate.
    ///
    /// A weighted blend of each biome's own heightfield; weights vary
    /// continuously across biome borders, so the blended surface is seamless
    /// even where adjacent regions have very different roughness.
    pub fn height(&self, world_x: f32, world_z: f32) -> f32 {
        let sample = self.biomes.sample(world_x, world_z);
        let mut height = 0.0;
        for kind in BiomeKind::ALL {
            height += sample.weight(kind) * self.kind_height(kind, world_x, world_z);
        }
        height
    }

    /// Raw biome weights at a world coordinate, for vertex attributes.
    pub fn sample_biome(&self, world_x: f32, world_z: f32) -> BiomeSample {
        self.biomes.sample(world_x, world_z)
    }

    fn kind_height(&self, kind: BiomeKind, world_x: f32, world_z: f32) -> f32 {
        let n = self.noise.fbm(
            world_x * kind.frequency(),
            world_z * kind.frequency(),
            OCTAVES,
            LACUNARITY,
            GAIN,
        );
        kind.base_height() + n * kind.amplitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    /// Hash a grid of height samples to a digest for whole-field comparison.
    fn height_field_digest(sampler: &TerrainSampler) -> u64 {
        let mut hasher = DefaultHasher::new();
        for ix in -40..40 {
            for iz in -40..40 {
                let h = sampler.height(ix as f32 * 1.7, iz as f32 * 2.3);
                h.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    #[test]
    fn test_same_seed_same_heights() {
        let a = TerrainSampler::new(1337);
        let b = TerrainSampler::new(1337);
        assert_eq!(
            height_field_digest(&a),
            height_field_digest(&b),
            "same seed must reproduce the exact height field"
        );
    }

    #[test]
    fn test_different_seeds_different_heights() {
        let a = TerrainSampler::new(0);
        let b = TerrainSampler::new(9999);
        assert_ne!(
            height_field_digest(&a),
            height_field_digest(&b),
            "different seeds should produce different worlds"
        );
    }

    #[test]
    fn test_heights_identical_across_threads() {
        let sampler = TerrainSampler::new(4242);
        let clone = sampler.clone();

        let handle_a = std::thread::spawn(move || height_field_digest(&sampler));
        let handle_b = std::thread::spawn(move || height_field_digest(&clone));

        assert_eq!(
            handle_a.join().unwrap(),
            handle_b.join().unwrap(),
            "sampling must be bit-identical regardless of thread"
        );
    }

    #[test]
    fn test_height_within_blended_biome_range() {
        // The blend can never leave the envelope of the per-kind ranges,
        // plus the small fbm interpolation overshoot.
        let sampler = TerrainSampler::new(77);
        for ix in -60..60 {
            for iz in -60..60 {
                let h = sampler.height(ix as f32 * 13.1, iz as f32 * 9.7);
                assert!(
                    (-9.5..=41.5).contains(&h),
                    "height {h} outside biome envelope at ({ix}, {iz})"
                );
            }
        }
    }

    #[test]
    fn test_no_height_discontinuities() {
        let sampler = TerrainSampler::new(1337);
        let step = 1e-3;
        for i in 0..5_000 {
            let x = i as f32 * step + 100.0;
            let delta = (sampler.height(x + step, 250.0) - sampler.height(x, 250.0)).abs();
            assert!(delta < 0.5, "height jump of {delta} at x={x}");
        }
    }

    #[test]
    fn test_biome_weights_drive_height_blend() {
        // Wherever one biome fully dominates, the height must match that
        // biome's own field.
        let sampler = TerrainSampler::new(555);
        let mut checked = 0;
        for ix in 0..200 {
            let x = ix as f32 * 51.0;
            let sample = sampler.sample_biome(x, 330.0);
            let dominant = sample.dominant();
            if sample.weight(dominant) > 0.999 {
                let expected = sampler.kind_height(dominant, x, 330.0);
                let actual = sampler.height(x, 330.0);
                assert!(
                    (expected - actual).abs() < 0.1,
                    "pure-{dominant:?} height {actual} != biome field {expected} at x={x}"
                );
                checked += 1;
            }
        }
        assert!(checked > 0, "expected at least one fully-dominated sample site");
    }
}
