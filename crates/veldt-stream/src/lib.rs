//! Chunk streaming: per-frame reconciliation of needed vs. live chunks,
//! asynchronous mesh builds on a worker pool, and LOD transitions.

mod chunk_key;
mod chunk_store;
mod feature_store;
mod pipeline;

pub use chunk_key::ChunkKey;
pub use chunk_store::{ChunkStore, TerrainChunk};
pub use feature_store::{FeatureChunk, FeatureStore};
pub use pipeline::{BuildPipeline, default_worker_count};
