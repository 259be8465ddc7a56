//! Deterministic placement and meshing of decorative features: grass tufts,
//! rocks, and trees at two detail tiers.
//!
//! Placement walks fixed grids inside the chunk footprint and draws one
//! hash sample per candidate site and category. The same site always rolls
//! the same draw, so chunk rebuilds reproduce identical scenery.

use glam::Vec3;
use veldt_terrain::{TerrainSampler, unit_sample};

use crate::data::{FeatureMeshData, FeatureVertex};

const GRASS_SPACING: i32 = 4;
const GRASS_CHANCE: f32 = 0.55;
const GRASS_SALT: u32 = 101;

const ROCK_SPACING: i32 = 12;
const ROCK_CHANCE: f32 = 0.25;
const ROCK_SALT: u32 = 203;
const ROCK_SCALE_SALT: u32 = 17;

const TREE_SPACING: i32 = 20;
const TREE_CHANCE: f32 = 0.18;
const TREE_SALT: u32 = 401;
const TREE_HEIGHT_SALT: u32 = 99;
const TRUNK_RADIUS: f32 = 0.25;

const GRASS_COLOR: Vec3 = Vec3::new(0.25, 0.6, 0.2);
const ROCK_COLOR: Vec3 = Vec3::new(0.45, 0.45, 0.45);
const TRUNK_COLOR: Vec3 = Vec3::new(0.35, 0.22, 0.1);
const LEAF_COLOR: Vec3 = Vec3::new(0.2, 0.5, 0.2);

/// Builds feature meshes for one chunk footprint at both detail tiers.
///
/// Like [`crate::TerrainMeshBuilder`], a pure value that can be cloned into
/// worker closures.
#[derive(Clone, Debug)]
pub struct FeaturePlacer {
    sampler: TerrainSampler,
    chunk_size: u32,
}

impl FeaturePlacer {
    /// Create a placer over a sampler for chunks of `chunk_size` world units.
    pub fn new(sampler: TerrainSampler, chunk_size: u32) -> Self {
        Self { sampler, chunk_size }
    }

    /// Full-detail mesh: grass cross-quads, rock boxes, and trees with
    /// trunks and leaf cross-quads.
    pub fn build_near(&self, chunk_x: i32, chunk_z: i32) -> FeatureMeshData {
        let mut geometry = GeometryBuffer::default();
        self.spawn_grass(&mut geometry, chunk_x, chunk_z);
        self.spawn_rocks(&mut geometry, chunk_x, chunk_z);
        self.spawn_trees(&mut geometry, chunk_x, chunk_z, true);
        geometry.finish()
    }

    /// Far-detail mesh: one billboard quad per tree, nothing else.
    pub fn build_far(&self, chunk_x: i32, chunk_z: i32) -> FeatureMeshData {
        let mut geometry = GeometryBuffer::default();
        self.spawn_trees(&mut geometry, chunk_x, chunk_z, false);
        geometry.finish()
    }

    fn spawn_grass(&self, geometry: &mut GeometryBuffer, chunk_x: i32, chunk_z: i32) {
        self.scan_sites(chunk_x, chunk_z, GRASS_SPACING, |world_x, world_z| {
            if unit_sample(self.sampler.seed(), world_x, world_z, GRASS_SALT) > GRASS_CHANCE {
                return;
            }
            let height = self.sampler.height(world_x as f32, world_z as f32);
            geometry.add_cross_quad(
                world_x as f32 + 0.5,
                height,
                world_z as f32 + 0.5,
                0.2,
                0.8,
                GRASS_COLOR,
            );
        });
    }

    fn spawn_rocks(&self, geometry: &mut GeometryBuffer, chunk_x: i32, chunk_z: i32) {
        self.scan_sites(chunk_x, chunk_z, ROCK_SPACING, |world_x, world_z| {
            if unit_sample(self.sampler.seed(), world_x, world_z, ROCK_SALT) > ROCK_CHANCE {
                return;
            }
            let height = self.sampler.height(world_x as f32, world_z as f32);
            let scale =
                0.4 + unit_sample(self.sampler.seed(), world_x, world_z, ROCK_SCALE_SALT) * 0.6;
            geometry.add_box(
                world_x as f32 + 0.5,
                height + scale * 0.5,
                world_z as f32 + 0.5,
                scale,
                scale * 0.6,
                scale,
                ROCK_COLOR,
            );
        });
    }

    fn spawn_trees(&self, geometry: &mut GeometryBuffer, chunk_x: i32, chunk_z: i32, near: bool) {
        self.scan_sites(chunk_x, chunk_z, TREE_SPACING, |world_x, world_z| {
            if unit_sample(self.sampler.seed(), world_x, world_z, TREE_SALT) > TREE_CHANCE {
                return;
            }
            let height = self.sampler.height(world_x as f32, world_z as f32);
            let trunk_height =
                2.5 + unit_sample(self.sampler.seed(), world_x, world_z, TREE_HEIGHT_SALT) * 1.5;
            let x = world_x as f32 + 0.5;
            let z = world_z as f32 + 0.5;
            if near {
                geometry.add_box(
                    x,
                    height + trunk_height * 0.5,
                    z,
                    TRUNK_RADIUS,
                    trunk_height,
                    TRUNK_RADIUS,
                    TRUNK_COLOR,
                );
                geometry.add_cross_quad(x, height + trunk_height, z, 1.2, 1.6, LEAF_COLOR);
            } else {
                geometry.add_billboard(x, height + trunk_height * 0.7, z, 1.2, 1.8, LEAF_COLOR);
            }
        });
    }

    /// Visit every candidate site on the `spacing` grid inside the chunk.
    fn scan_sites(&self, chunk_x: i32, chunk_z: i32, spacing: i32, mut visit: impl FnMut(i32, i32)) {
        let size = self.chunk_size as i32;
        let mut z = 0;
        while z < size {
            let mut x = 0;
            while x < size {
                visit(chunk_x * size + x, chunk_z * size + z);
                x += spacing;
            }
            z += spacing;
        }
    }
}

/// Append-only vertex/index accumulator for one build call.
#[derive(Debug, Default)]
struct GeometryBuffer {
    vertices: Vec<FeatureVertex>,
    indices: Vec<u32>,
}

impl GeometryBuffer {
    /// Two vertical quads crossed at 90 degrees.
    fn add_cross_quad(&mut self, x: f32, y: f32, z: f32, half_width: f32, height: f32, color: Vec3) {
        self.add_quad(x, y, z, half_width, height, color, 0.0);
        self.add_quad(x, y, z, half_width, height, color, std::f32::consts::FRAC_PI_2);
    }

    /// A single vertical quad, the far-tier tree impostor.
    fn add_billboard(&mut self, x: f32, y: f32, z: f32, half_width: f32, height: f32, color: Vec3) {
        self.add_quad(x, y, z, half_width, height, color, 0.0);
    }

    fn add_quad(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        half_width: f32,
        height: f32,
        color: Vec3,
        rotation: f32,
    ) {
        let cos = libm::cosf(rotation);
        let sin = libm::sinf(rotation);
        let right = Vec3::new(cos, 0.0, sin) * half_width;
        let normal = Vec3::new(-sin, 0.0, cos);

        let base = self.vertices.len() as u32;
        self.push_vertex(x - right.x, y, z - right.z, normal, color);
        self.push_vertex(x + right.x, y, z + right.z, normal, color);
        self.push_vertex(x + right.x, y + height, z + right.z, normal, color);
        self.push_vertex(x - right.x, y + height, z - right.z, normal, color);
        self.push_quad_indices(base);
    }

    /// An axis-aligned box as six outward-facing quads.
    #[allow(clippy::too_many_arguments)]
    fn add_box(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        half_width: f32,
        half_height: f32,
        half_depth: f32,
        color: Vec3,
    ) {
        let (hw, hh, hd) = (half_width, half_height, half_depth);
        let faces: [(Vec3, [[f32; 3]; 4]); 6] = [
            (
                Vec3::Z,
                [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
            ),
            (
                Vec3::NEG_Z,
                [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
            ),
            (
                Vec3::X,
                [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
            ),
            (
                Vec3::NEG_X,
                [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
            ),
            (
                Vec3::Y,
                [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
            ),
            (
                Vec3::NEG_Y,
                [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
            ),
        ];

        for (normal, corners) in faces {
            let base = self.vertices.len() as u32;
            for corner in corners {
                self.push_vertex(x + corner[0], y + corner[1], z + corner[2], normal, color);
            }
            self.push_quad_indices(base);
        }
    }

    fn push_vertex(&mut self, x: f32, y: f32, z: f32, normal: Vec3, color: Vec3) {
        self.vertices.push(FeatureVertex {
            position: [x, y, z],
            normal: normal.to_array(),
            color: color.to_array(),
        });
    }

    fn push_quad_indices(&mut self, base: u32) {
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn finish(self) -> FeatureMeshData {
        FeatureMeshData {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: i32 = 1337;
    const CHUNK_SIZE: u32 = 64;

    fn placer() -> FeaturePlacer {
        FeaturePlacer::new(TerrainSampler::new(SEED), CHUNK_SIZE)
    }

    /// Count sites on the spacing grid whose draw passes the category chance.
    fn accepted_sites(chunk_x: i32, chunk_z: i32, spacing: i32, salt: u32, chance: f32) -> u32 {
        let seed = SEED as u32;
        let size = CHUNK_SIZE as i32;
        let mut count = 0;
        let mut z = 0;
        while z < size {
            let mut x = 0;
            while x < size {
                if unit_sample(seed, chunk_x * size + x, chunk_z * size + z, salt) <= chance {
                    count += 1;
                }
                x += spacing;
            }
            z += spacing;
        }
        count
    }

    #[test]
    fn test_builds_are_deterministic() {
        let p = placer();
        let a = p.build_near(3, -2);
        let b = p.build_near(3, -2);
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn test_near_vertex_count_matches_accepted_sites() {
        // grass cross-quad: 8 vertices; rock box: 24; tree box + cross-quad: 32.
        let grass = accepted_sites(0, 0, GRASS_SPACING, GRASS_SALT, GRASS_CHANCE);
        let rocks = accepted_sites(0, 0, ROCK_SPACING, ROCK_SALT, ROCK_CHANCE);
        let trees = accepted_sites(0, 0, TREE_SPACING, TREE_SALT, TREE_CHANCE);

        let mesh = placer().build_near(0, 0);
        assert_eq!(
            mesh.vertices.len() as u32,
            grass * 8 + rocks * 24 + trees * 32,
            "near mesh should hold exactly the accepted sites' geometry"
        );
    }

    #[test]
    fn test_far_tier_is_one_quad_per_tree() {
        let trees = accepted_sites(1, 4, TREE_SPACING, TREE_SALT, TREE_CHANCE);
        let mesh = placer().build_far(1, 4);
        assert_eq!(mesh.vertices.len() as u32, trees * 4);
        assert_eq!(mesh.indices.len() as u32, trees * 6);
    }

    #[test]
    fn test_indices_reference_valid_vertices() {
        let p = placer();
        for mesh in [p.build_near(-5, 9), p.build_far(-5, 9)] {
            let count = mesh.vertices.len() as u32;
            for &i in &mesh.indices {
                assert!(i < count, "index {i} out of range");
            }
            assert_eq!(mesh.indices.len() % 6, 0, "geometry is emitted per quad");
        }
    }

    #[test]
    fn test_sites_stay_inside_chunk_footprint() {
        let mesh = placer().build_near(2, -3);
        let min_x = 2.0 * CHUNK_SIZE as f32;
        let min_z = -3.0 * CHUNK_SIZE as f32;
        // Geometry extends at most a couple of units past its site.
        for v in &mesh.vertices {
            assert!(v.position[0] >= min_x - 2.0 && v.position[0] < min_x + CHUNK_SIZE as f32 + 2.0);
            assert!(v.position[2] >= min_z - 2.0 && v.position[2] < min_z + CHUNK_SIZE as f32 + 2.0);
        }
    }

    #[test]
    fn test_different_categories_differ_per_site() {
        // If the category draws were correlated, grass and rock acceptance
        // patterns would coincide; count how often they agree.
        let mut both = 0;
        let mut grass_only = 0;
        for cx in 0..8 {
            for cz in 0..8 {
                let g = accepted_sites(cx, cz, 12, GRASS_SALT, 0.25);
                let r = accepted_sites(cx, cz, 12, ROCK_SALT, 0.25);
                both += g.min(r);
                grass_only += g.saturating_sub(r);
            }
        }
        assert!(
            grass_only > 0,
            "salted draws should decorrelate categories (both={both})"
        );
    }

    #[test]
    fn test_empty_far_mesh_when_no_tree_accepted() {
        // Scan for a chunk with no accepted trees; with chance 0.18 over 16
        // sites per chunk, one appears quickly.
        let p = placer();
        for cx in 0..64 {
            for cz in 0..8 {
                if accepted_sites(cx, cz, TREE_SPACING, TREE_SALT, TREE_CHANCE) == 0 {
                    assert!(p.build_far(cx, cz).is_empty());
                    return;
                }
            }
        }
        panic!("no tree-free chunk found in scan range");
    }
}
