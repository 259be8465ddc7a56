//! Cellular biome partitioning with smooth boundary blending.
//!
//! The plane is cut into square cells; each cell owns one jittered feature
//! point and one hash-chosen biome kind. Sampling blends the two nearest
//! feature points so biome influence fades smoothly across region borders
//! instead of snapping at Voronoi edges.

use crate::hash::lattice_hash;

/// The fixed set of terrain styles, each with its own height character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeKind {
    /// Rolling low plains.
    Grassland,
    /// Tall, rough uplands.
    Highlands,
    /// Cold mid-height flats.
    Tundra,
}

impl BiomeKind {
    /// All kinds, in weight-array order.
    pub const ALL: [BiomeKind; 3] = [BiomeKind::Grassland, BiomeKind::Highlands, BiomeKind::Tundra];

    /// Number of biome kinds.
    pub const COUNT: usize = 3;

    /// Mean elevation of this biome, in world units.
    pub fn base_height(self) -> f32 {
        match self {
            BiomeKind::Grassland => 6.0,
            BiomeKind::Highlands => 12.0,
            BiomeKind::Tundra => 10.0,
        }
    }

    /// Height amplitude applied to this biome's noise.
    pub fn amplitude(self) -> f32 {
        match self {
            BiomeKind::Grassland => 14.0,
            BiomeKind::Highlands => 28.0,
            BiomeKind::Tundra => 18.0,
        }
    }

    /// Spatial frequency of this biome's noise.
    pub fn frequency(self) -> f32 {
        match self {
            BiomeKind::Grassland => 0.008,
            BiomeKind::Highlands => 0.012,
            BiomeKind::Tundra => 0.01,
        }
    }

    fn index(self) -> usize {
        match self {
            BiomeKind::Grassland => 0,
            BiomeKind::Highlands => 1,
            BiomeKind::Tundra => 2,
        }
    }
}

/// Normalized per-kind influence weights at one coordinate.
///
/// Weights are non-negative and sum to 1 (within a small epsilon). Built
/// fresh per query and never mutated afterward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    weights: [f32; 3],
}

impl BiomeSample {
    /// Weight of a specific biome kind.
    pub fn weight(&self, kind: BiomeKind) -> f32 {
        self.weights[kind.index()]
    }

    /// The weight triple in [`BiomeKind::ALL`] order.
    pub fn weights(&self) -> [f32; 3] {
        self.weights
    }

    /// The kind with the largest weight.
    pub fn dominant(&self) -> BiomeKind {
        let mut best = BiomeKind::Grassland;
        for kind in BiomeKind::ALL {
            if self.weights[kind.index()] > self.weights[best.index()] {
                best = kind;
            }
        }
        best
    }
}

/// Jittered-Voronoi biome field over square cells of `cell_size` world units.
#[derive(Clone, Copy, Debug)]
pub struct BiomeField {
    seed: u32,
    cell_size: f32,
}

impl BiomeField {
    /// Create a field bound to a seed and a cell size in world units.
    pub fn new(seed: u32, cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "biome cell size must be positive");
        Self { seed, cell_size }
    }

    /// Sample blended biome weights at a world coordinate.
    ///
    /// Scans the containing cell and its 8 neighbors for the two closest
    /// jittered feature points, then splits influence between their kinds
    /// with a smoothstep of the distance ratio. Weight is 1 for the closest
    /// kind exactly at its feature point and approaches an even split toward
    /// the midline with the runner-up region.
    pub fn sample(&self, world_x: f32, world_z: f32) -> BiomeSample {
        let base_x = fast_floor(world_x / self.cell_size);
        let base_z = fast_floor(world_z / self.cell_size);

        let mut closest_dist = f32::INFINITY;
        let mut second_dist = f32::INFINITY;
        let mut closest_kind = BiomeKind::Grassland;
        let mut second_kind = BiomeKind::Highlands;

        for dz in -1..=1 {
            for dx in -1..=1 {
                let cell_x = base_x + dx;
                let cell_z = base_z + dz;
                let (jitter_x, jitter_z) = self.feature_offset(cell_x, cell_z);
                let feature_x = (cell_x as f32 + jitter_x) * self.cell_size;
                let feature_z = (cell_z as f32 + jitter_z) * self.cell_size;
                let dist = distance_squared(world_x, world_z, feature_x, feature_z);
                let kind = self.cell_kind(cell_x, cell_z);

                if dist < closest_dist {
                    second_dist = closest_dist;
                    second_kind = closest_kind;
                    closest_dist = dist;
                    closest_kind = kind;
                } else if dist < second_dist {
                    second_dist = dist;
                    second_kind = kind;
                }
            }
        }

        let ratio = libm::sqrtf(closest_dist / (second_dist + 1e-4));
        let blend = smoothstep(0.0, 1.0, ratio);
        let primary = 1.0 - blend;
        let secondary = blend;

        let mut weights = [0.0f32; 3];
        weights[closest_kind.index()] += primary;
        weights[second_kind.index()] += secondary;

        let sum = weights[0] + weights[1] + weights[2] + 1e-4;
        BiomeSample {
            weights: [weights[0] / sum, weights[1] / sum, weights[2] / sum],
        }
    }

    /// Per-cell feature point jitter in `[0, 1)^2`, from the hash halves.
    fn feature_offset(&self, cell_x: i32, cell_z: i32) -> (f32, f32) {
        let h = lattice_hash(self.seed, cell_x, cell_z, 0);
        let x = (h & 0xffff) as f32 / 65535.0;
        let z = ((h >> 16) & 0xffff) as f32 / 65535.0;
        (x, z)
    }

    /// Discrete kind for a cell: hash mapped through fixed cumulative
    /// thresholds (45% grassland, 30% highlands, 25% tundra).
    fn cell_kind(&self, cell_x: i32, cell_z: i32) -> BiomeKind {
        let h = lattice_hash(
            self.seed,
            cell_x.wrapping_mul(73_856_093),
            cell_z.wrapping_mul(19_349_663),
            0,
        );
        let value = (h as i32).rem_euclid(100);
        if value < 45 {
            BiomeKind::Grassland
        } else if value < 75 {
            BiomeKind::Highlands
        } else {
            BiomeKind::Tundra
        }
    }
}

#[inline]
fn fast_floor(value: f32) -> i32 {
    let i = value as i32;
    if value < i as f32 { i - 1 } else { i }
}

#[inline]
fn distance_squared(x0: f32, z0: f32, x1: f32, z1: f32) -> f32 {
    let dx = x0 - x1;
    let dz = z0 - z1;
    dx * dx + dz * dz
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
