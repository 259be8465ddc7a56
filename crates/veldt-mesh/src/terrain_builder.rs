//! Terrain chunk meshing: regular grid sampling plus smooth normal
//! reconstruction.

use glam::Vec3;
use veldt_terrain::TerrainSampler;

use crate::data::{TerrainMeshData, TerrainVertex};

/// Texture tiling factor applied to world coordinates.
const UV_SCALE: f32 = 0.1;

/// Builds renderable grid meshes for terrain chunks.
///
/// A pure value: cloning one into a worker closure gives the worker its own
/// immutable sampler, so builds for different chunks can run fully in
/// parallel with no shared state.
#[derive(Clone, Debug)]
pub struct TerrainMeshBuilder {
    sampler: TerrainSampler,
    chunk_size: u32,
}

impl TerrainMeshBuilder {
    /// Create a builder over a sampler for chunks of `chunk_size` world units.
    pub fn new(sampler: TerrainSampler, chunk_size: u32) -> Self {
        Self { sampler, chunk_size }
    }

    /// Build the mesh for the chunk at grid coordinate `(chunk_x, chunk_z)`.
    ///
    /// LOD 0 samples every world unit; LOD 1 doubles the step, quartering the
    /// triangle count over the same footprint. Vertex normals are rebuilt by
    /// accumulating each triangle's unnormalized face normal into its three
    /// corners and normalizing once at the end, which weights every adjacent
    /// triangle by its area.
    pub fn build(&self, chunk_x: i32, chunk_z: i32, lod: u8) -> TerrainMeshData {
        let step = if lod == 0 { 1 } else { 2 };
        let verts_per_side = self.chunk_size / step + 1;

        let mut vertices = Vec::with_capacity((verts_per_side * verts_per_side) as usize);
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        let base_x = chunk_x * self.chunk_size as i32;
        let base_z = chunk_z * self.chunk_size as i32;

        for z in 0..verts_per_side {
            for x in 0..verts_per_side {
                let world_x = (base_x + (x * step) as i32) as f32;
                let world_z = (base_z + (z * step) as i32) as f32;
                let height = self.sampler.height(world_x, world_z);
                let biome = self.sampler.sample_biome(world_x, world_z);
                min_y = min_y.min(height);
                max_y = max_y.max(height);

                vertices.push(TerrainVertex {
                    position: [world_x, height, world_z],
                    normal: [0.0, 1.0, 0.0],
                    uv: [world_x * UV_SCALE, world_z * UV_SCALE],
                    biome: biome.weights(),
                });
            }
        }

        let quads_per_side = verts_per_side - 1;
        let mut indices = Vec::with_capacity((quads_per_side * quads_per_side * 6) as usize);
        for z in 0..quads_per_side {
            for x in 0..quads_per_side {
                let top_left = z * verts_per_side + x;
                let top_right = top_left + 1;
                let bottom_left = (z + 1) * verts_per_side + x;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[top_left, bottom_left, top_right]);
                indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
            }
        }

        rebuild_normals(&mut vertices, &indices);

        TerrainMeshData {
            vertices,
            indices,
            min_y,
            max_y,
            lod,
        }
    }
}

/// Zero all normals, accumulate unnormalized face normals, normalize once.
fn rebuild_normals(vertices: &mut [TerrainVertex], indices: &[u32]) {
    for v in vertices.iter_mut() {
        v.normal = [0.0; 3];
    }

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let p0 = Vec3::from(vertices[i0].position);
        let p1 = Vec3::from(vertices[i1].position);
        let p2 = Vec3::from(vertices[i2].position);
        let face = (p1 - p0).cross(p2 - p0);

        for &i in &[i0, i1, i2] {
            let n = Vec3::from(vertices[i].normal) + face;
            vertices[i].normal = n.to_array();
        }
    }

    for v in vertices.iter_mut() {
        v.normal = Vec3::from(v.normal).normalize().to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TerrainMeshBuilder {
        TerrainMeshBuilder::new(TerrainSampler::new(1337), 16)
    }

    #[test]
    fn test_vertex_and_triangle_counts_per_lod() {
        let b = builder();

        let fine = b.build(0, 0, 0);
        assert_eq!(fine.vertices.len(), 17 * 17);
        assert_eq!(fine.triangle_count(), 2 * 16 * 16);
        assert_eq!(fine.lod, 0);

        let coarse = b.build(0, 0, 1);
        assert_eq!(coarse.vertices.len(), 9 * 9);
        assert_eq!(coarse.triangle_count(), 2 * 8 * 8);
        assert_eq!(coarse.lod, 1);
    }

    #[test]
    fn test_all_indices_in_range() {
        let mesh = builder().build(-3, 7, 0);
        let count = mesh.vertices.len() as u32;
        for &i in &mesh.indices {
            assert!(i < count, "index {i} out of range (vertex count {count})");
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        for lod in [0, 1] {
            let mesh = builder().build(2, -5, lod);
            for (i, v) in mesh.vertices.iter().enumerate() {
                let len = Vec3::from(v.normal).length();
                assert!(
                    (len - 1.0).abs() < 1e-3,
                    "vertex {i} normal has length {len} at lod {lod}"
                );
            }
        }
    }

    #[test]
    fn test_height_bounds_cover_all_vertices() {
        let mesh = builder().build(1, 1, 0);
        assert!(mesh.min_y <= mesh.max_y);
        for v in &mesh.vertices {
            assert!(v.position[1] >= mesh.min_y && v.position[1] <= mesh.max_y);
        }
    }

    #[test]
    fn test_footprint_spans_chunk() {
        let mesh = builder().build(2, -1, 0);
        let first = mesh.vertices.first().unwrap().position;
        let last = mesh.vertices.last().unwrap().position;
        assert_eq!(first[0], 32.0);
        assert_eq!(first[2], -16.0);
        assert_eq!(last[0], 48.0);
        assert_eq!(last[2], 0.0);
    }

    #[test]
    fn test_builds_are_deterministic() {
        let b = builder();
        let a = b.build(4, 4, 1);
        let c = b.build(4, 4, 1);
        assert_eq!(a.vertices, c.vertices);
        assert_eq!(a.indices, c.indices);
        assert_eq!(a.min_y.to_bits(), c.min_y.to_bits());
        assert_eq!(a.max_y.to_bits(), c.max_y.to_bits());
    }

    #[test]
    fn test_biome_weights_carried_per_vertex() {
        let mesh = builder().build(0, 0, 1);
        for v in &mesh.vertices {
            let sum: f32 = v.biome.iter().sum();
            assert!((sum - 1.0).abs() < 2e-4, "vertex biome weights sum to {sum}");
        }
    }
}
