//! Feature chunk lifecycle: streaming of placed-object geometry at two
//! detail tiers.
//!
//! Mirrors the terrain store's reconciliation without the LOD axis: one
//! build per chunk produces the near and far meshes together, and both are
//! applied in the same reconciliation step so a chunk never shows one tier
//! without the other having been built.

use crossbeam_channel::{Receiver, Sender, unbounded};
use dashmap::DashMap;
use glam::Vec3;
use rustc_hash::FxHashSet;
use tracing::debug;
use veldt_config::{ConfigError, WorldConfig};
use veldt_mesh::{FeatureMeshData, FeaturePlacer, MeshHandle, MeshUpload};
use veldt_terrain::TerrainSampler;

use crate::chunk_key::ChunkKey;
use crate::pipeline::{BuildPipeline, default_worker_count};

/// One live feature chunk record.
#[derive(Debug)]
pub struct FeatureChunk {
    key: ChunkKey,
    near: Option<MeshHandle>,
    far: Option<MeshHandle>,
}

impl FeatureChunk {
    /// The chunk's grid coordinate.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Full-detail mesh handle, absent while the build is pending.
    pub fn near_mesh(&self) -> Option<MeshHandle> {
        self.near
    }

    /// Billboard-tier mesh handle, applied together with the near mesh.
    pub fn far_mesh(&self) -> Option<MeshHandle> {
        self.far
    }

    /// True once both tiers have been uploaded.
    pub fn is_ready(&self) -> bool {
        self.near.is_some() && self.far.is_some()
    }
}

/// Envelope carrying both tiers of one finished feature build.
struct BuildResult {
    key: ChunkKey,
    near: FeatureMeshData,
    far: FeatureMeshData,
}

/// Owns every live feature chunk and streams them around the viewpoint.
pub struct FeatureStore<U: MeshUpload> {
    chunks: DashMap<u64, FeatureChunk>,
    result_tx: Sender<BuildResult>,
    result_rx: Receiver<BuildResult>,
    pipeline: BuildPipeline,
    placer: FeaturePlacer,
    chunk_size: u32,
    feature_distance: i32,
    uploader: U,
    shut_down: bool,
}

impl<U: MeshUpload> FeatureStore<U> {
    /// Create a store from validated settings, a sampler, and an upload
    /// backend.
    pub fn new(
        config: &WorldConfig,
        sampler: TerrainSampler,
        uploader: U,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let workers = config.worker_threads.unwrap_or_else(default_worker_count);
        let (result_tx, result_rx) = unbounded();
        Ok(Self {
            chunks: DashMap::new(),
            result_tx,
            result_rx,
            pipeline: BuildPipeline::new(workers),
            placer: FeaturePlacer::new(sampler, config.chunk_size),
            chunk_size: config.chunk_size,
            feature_distance: config.feature_distance as i32,
            uploader,
            shut_down: false,
        })
    }

    /// Reconcile the live feature chunk set against the viewpoint. Call once
    /// per frame.
    pub fn update(&mut self, viewpoint: Vec3) {
        if self.shut_down {
            return;
        }
        let center = ChunkKey::from_world(viewpoint.x, viewpoint.z, self.chunk_size);
        let radius = self.feature_distance;

        let mut needed = FxHashSet::default();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let key = center.offset(dx, dz);
                let packed = key.pack();
                needed.insert(packed);
                if !self.chunks.contains_key(&packed) {
                    self.chunks.insert(
                        packed,
                        FeatureChunk {
                            key,
                            near: None,
                            far: None,
                        },
                    );
                    self.submit_build(key);
                }
            }
        }

        let uploader = &mut self.uploader;
        self.chunks.retain(|packed, chunk| {
            if needed.contains(packed) {
                return true;
            }
            if let Some(handle) = chunk.near.take() {
                uploader.release(handle);
            }
            if let Some(handle) = chunk.far.take() {
                uploader.release(handle);
            }
            false
        });

        self.drain_results();
    }

    /// Read-only iteration over the live feature chunk records.
    pub fn chunks<'a>(
        &'a self,
    ) -> impl Iterator<Item = impl std::ops::Deref<Target = FeatureChunk> + 'a> + 'a {
        self.chunks.iter()
    }

    /// Number of live feature chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no feature chunks are live.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Builds queued or executing on the worker pool.
    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight()
    }

    /// The upload backend, for statistics.
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Stop the worker pool and release both meshes of every chunk.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.pipeline.shutdown();

        let uploader = &mut self.uploader;
        self.chunks.retain(|_, chunk| {
            if let Some(handle) = chunk.near.take() {
                uploader.release(handle);
            }
            if let Some(handle) = chunk.far.take() {
                uploader.release(handle);
            }
            false
        });
        debug!("feature store shut down");
    }

    fn drain_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            let Some(mut chunk) = self.chunks.get_mut(&result.key.pack()) else {
                continue;
            };
            // Upload and swap both tiers in one step so readers never see a
            // half-applied pair.
            let near = self.uploader.upload_feature(result.near);
            let far = self.uploader.upload_feature(result.far);
            if let Some(old) = chunk.near.replace(near) {
                self.uploader.release(old);
            }
            if let Some(old) = chunk.far.replace(far) {
                self.uploader.release(old);
            }
        }
    }

    fn submit_build(&self, key: ChunkKey) {
        let placer = self.placer.clone();
        let sender = self.result_tx.clone();
        self.pipeline.submit(move || {
            let near = placer.build_near(key.x, key.z);
            let far = placer.build_far(key.x, key.z);
            let _ = sender.send(BuildResult { key, near, far });
        });
    }
}

impl<U: MeshUpload> Drop for FeatureStore<U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
