//! Mesh payload types produced by the builders and consumed once by upload.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// One terrain surface vertex.
///
/// Interleaved layout matching the renderer's vertex attributes:
/// position, normal, uv, biome weights.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Accumulated, normalized surface normal.
    pub normal: [f32; 3],
    /// Tiling texture coordinates.
    pub uv: [f32; 2],
    /// Biome influence weights, summing to 1.
    pub biome: [f32; 3],
}

/// One feature (grass/rock/tree) vertex: flat-shaded colored geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FeatureVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Face normal.
    pub normal: [f32; 3],
    /// Flat vertex color.
    pub color: [f32; 3],
}

// Interleaved stride the render pipelines assume.
const_assert_eq!(std::mem::size_of::<TerrainVertex>(), 44);
const_assert_eq!(std::mem::size_of::<FeatureVertex>(), 36);

/// A fully built terrain chunk mesh.
///
/// Produced once on a worker thread, immutable afterward, and consumed
/// exactly once when handed to the upload backend.
#[derive(Clone, Debug)]
pub struct TerrainMeshData {
    /// Vertex buffer.
    pub vertices: Vec<TerrainVertex>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u32>,
    /// Lowest sampled height in the chunk.
    pub min_y: f32,
    /// Highest sampled height in the chunk.
    pub max_y: f32,
    /// The LOD tier this mesh was built at.
    pub lod: u8,
}

impl TerrainMeshData {
    /// Number of triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// A fully built feature mesh (one detail tier of one chunk).
#[derive(Clone, Debug, Default)]
pub struct FeatureMeshData {
    /// Vertex buffer.
    pub vertices: Vec<FeatureVertex>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u32>,
}

impl FeatureMeshData {
    /// True when no feature site in the chunk accepted a spawn.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_vertex_bytes_match_stride() {
        let mesh = TerrainMeshData {
            vertices: vec![TerrainVertex::zeroed(); 5],
            indices: vec![0, 1, 2],
            min_y: 0.0,
            max_y: 1.0,
            lod: 0,
        };
        assert_eq!(mesh.vertex_bytes().len(), 5 * 44);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_empty_feature_mesh() {
        let mesh = FeatureMeshData::default();
        assert!(mesh.is_empty());
        assert!(mesh.vertex_bytes().is_empty());
    }
}
