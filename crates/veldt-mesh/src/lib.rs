//! Mesh construction for streamed terrain: grid meshing of the height field,
//! deterministic feature geometry, and the upload seam to the renderer.

mod data;
mod feature_builder;
mod terrain_builder;
mod upload;

pub use data::{FeatureMeshData, FeatureVertex, TerrainMeshData, TerrainVertex};
pub use feature_builder::FeaturePlacer;
pub use terrain_builder::TerrainMeshBuilder;
pub use upload::{MeshHandle, MeshUpload, NullUpload};
