//! Lattice gradient noise and multi-octave fractal Brownian motion.
//!
//! Gradients come from two hash bits per lattice point (the four diagonal
//! directions), interpolated with a quintic fade so the field is continuous
//! and smooth across cell boundaries.

use crate::hash::lattice_hash;

/// Seeded 2D gradient noise sampler.
///
/// A pure value type: carries only the seed, so it is trivially `Copy` and
/// safe to hand to any number of worker threads.
#[derive(Clone, Copy, Debug)]
pub struct GradientNoise {
    seed: u32,
}

impl GradientNoise {
    /// Create a sampler bound to the given seed.
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Sample a single octave of gradient noise at `(x, z)`.
    ///
    /// Output is approximately in `[-1, 1]` and continuous everywhere,
    /// including across integer lattice lines.
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let x0 = fast_floor(x);
        let z0 = fast_floor(z);
        let x1 = x0 + 1;
        let z1 = z0 + 1;

        let sx = fade(x - x0 as f32);
        let sz = fade(z - z0 as f32);

        let n00 = self.grad_dot(x0, z0, x - x0 as f32, z - z0 as f32);
        let n10 = self.grad_dot(x1, z0, x - x1 as f32, z - z0 as f32);
        let n01 = self.grad_dot(x0, z1, x - x0 as f32, z - z1 as f32);
        let n11 = self.grad_dot(x1, z1, x - x1 as f32, z - z1 as f32);

        let ix0 = lerp(n00, n10, sx);
        let ix1 = lerp(n01, n11, sx);
        lerp(ix0, ix1, sz)
    }

    /// Sum `octaves` layers of gradient noise, each at `frequency *= lacunarity`
    /// and `amplitude *= gain`, normalized by the amplitude sum so the result
    /// stays bounded regardless of octave count.
    pub fn fbm(&self, x: f32, z: f32, octaves: u32, lacunarity: f32, gain: f32) -> f32 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut sum = 0.0;
        let mut max = 0.0;
        for _ in 0..octaves {
            sum += amplitude * self.sample(x * frequency, z * frequency);
            max += amplitude;
            amplitude *= gain;
            frequency *= lacunarity;
        }
        sum / max
    }

    /// Dot product of the lattice point's pseudo-random diagonal gradient with
    /// the offset to the sample point. Two hash bits select among (±1, ±1).
    fn grad_dot(&self, gx: i32, gz: i32, dx: f32, dz: f32) -> f32 {
        let h = lattice_hash(self.seed, gx, gz, 0) & 3;
        let grad_x = if h == 0 || h == 3 { 1.0 } else { -1.0 };
        let grad_z = if h == 0 || h == 1 { 1.0 } else { -1.0 };
        grad_x * dx + grad_z * dz
    }
}

/// Truncate-then-correct floor, valid for the coordinate ranges this engine
/// works in (well inside `i32`).
#[inline]
fn fast_floor(value: f32) -> i32 {
    let i = value as i32;
    if value < i as f32 { i - 1 } else { i }
}

/// Quintic smoothing curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}
