//! Terrain chunk lifecycle: needed-set reconciliation, two-tier LOD
//! selection, and application of asynchronously built meshes.
//!
//! A chunk moves absent → pending → ready, with a rebuilding phase whenever
//! its requested LOD differs from the mesh it currently shows. The old mesh
//! stays renderable until the replacement lands; in-flight builds are never
//! cancelled, and results for chunks that have since been removed are
//! silently discarded.

use crossbeam_channel::{Receiver, Sender, unbounded};
use dashmap::DashMap;
use glam::Vec3;
use rustc_hash::FxHashSet;
use tracing::debug;
use veldt_config::{ConfigError, WorldConfig};
use veldt_mesh::{MeshHandle, MeshUpload, TerrainMeshBuilder};
use veldt_terrain::TerrainSampler;

use crate::chunk_key::ChunkKey;
use crate::pipeline::{BuildPipeline, default_worker_count};

/// Fine LOD: one sample per world unit.
const LOD_FINE: u8 = 0;
/// Coarse LOD: doubled sample step.
const LOD_COARSE: u8 = 1;

/// One live terrain chunk record.
#[derive(Debug)]
pub struct TerrainChunk {
    key: ChunkKey,
    mesh: Option<MeshHandle>,
    min_y: f32,
    max_y: f32,
    lod: u8,
    requested_lod: u8,
}

impl TerrainChunk {
    /// The chunk's grid coordinate.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Handle of the uploaded mesh, absent while the first build is pending.
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// Lowest height in the current mesh (meaningful once ready).
    pub fn min_y(&self) -> f32 {
        self.min_y
    }

    /// Highest height in the current mesh (meaningful once ready).
    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    /// LOD tier of the mesh currently shown.
    pub fn lod(&self) -> u8 {
        self.lod
    }

    /// LOD tier most recently requested for this chunk. May differ from
    /// [`lod`](Self::lod) while a rebuild is in flight.
    pub fn requested_lod(&self) -> u8 {
        self.requested_lod
    }

    /// True once a mesh has been uploaded for this chunk.
    pub fn is_ready(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Envelope carrying one finished build from a worker to reconciliation.
struct BuildResult {
    key: ChunkKey,
    mesh: veldt_mesh::TerrainMeshData,
}

/// Owns every live terrain chunk and drives streaming around the viewpoint.
///
/// [`update`](Self::update) runs on the frame thread once per frame and never
/// blocks: it submits builds and drains whatever results have already
/// arrived. The live map is safe for concurrent read-only iteration (e.g. a
/// renderer culling chunks) while builds are in flight.
pub struct ChunkStore<U: MeshUpload> {
    chunks: DashMap<u64, TerrainChunk>,
    result_tx: Sender<BuildResult>,
    result_rx: Receiver<BuildResult>,
    pipeline: BuildPipeline,
    builder: TerrainMeshBuilder,
    chunk_size: u32,
    render_distance: i32,
    lod_switch_distance: u32,
    uploader: U,
    shut_down: bool,
}

impl<U: MeshUpload> ChunkStore<U> {
    /// Create a store from validated settings, a sampler, and an upload
    /// backend. Fails fast on a configuration the streamer cannot run with.
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
            builder: TerrainMeshBuilder::new(sampler, config.chunk_size),
            chunk_size: config.chunk_size,
            render_distance: config.render_distance as i32,
            lod_switch_distance: config.lod_switch_distance,
            uploader,
            shut_down: false,
        })
    }

    /// Reconcile the live chunk set against the viewpoint. Call once per
    /// frame before iterating [`chunks`](Self::chunks).
    pub fn update(&mut self, viewpoint: Vec3) {
        if self.shut_down {
            return;
        }
        let center = ChunkKey::from_world(viewpoint.x, viewpoint.z, self.chunk_size);
        let radius = self.render_distance;

        let mut needed = FxHashSet::default();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let key = center.offset(dx, dz);
                let packed = key.pack();
                needed.insert(packed);
                let lod = self.select_lod(dx, dz);

                match self.chunks.get_mut(&packed) {
                    None => {
                        self.chunks.insert(
                            packed,
                            TerrainChunk {
                                key,
                                mesh: None,
                                min_y: 0.0,
                                max_y: 0.0,
                                lod,
                                requested_lod: lod,
                            },
                        );
                        self.submit_build(key, lod);
                    }
                    Some(mut chunk) => {
                        if chunk.requested_lod != lod {
                            chunk.requested_lod = lod;
                            drop(chunk);
                            self.submit_build(key, lod);
                        }
                    }
                }
            }
        }

        // Drop chunks that left the needed set, releasing their meshes
        // exactly once. A build still in flight for a dropped chunk will be
        // discarded when its result arrives.
        let uploader = &mut self.uploader;
        self.chunks.retain(|packed, chunk| {
            if needed.contains(packed) {
                return true;
            }
            if let Some(handle) = chunk.mesh.take() {
                uploader.release(handle);
            }
            false
        });

        self.drain_results();
    }

    /// Read-only iteration over the live chunk records.
    pub fn chunks<'a>(
        &'a self,
    ) -> impl Iterator<Item = impl std::ops::Deref<Target = TerrainChunk> + 'a> + 'a {
        self.chunks.iter()
    }

    /// Number of live chunks (pending and ready).
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no chunks are live.
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

    /// Stop the worker pool and release every owned mesh. Results of still
    /// pending builds are discarded. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.pipeline.shutdown();

        let uploader = &mut self.uploader;
        self.chunks.retain(|_, chunk| {
            if let Some(handle) = chunk.mesh.take() {
                uploader.release(handle);
            }
            false
        });
        debug!("terrain store shut down");
    }

    /// Apply every queued build result without blocking.
    fn drain_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            let Some(mut chunk) = self.chunks.get_mut(&result.key.pack()) else {
                // The chunk was removed while its build was in flight.
                continue;
            };
            let (min_y, max_y, lod) = (result.mesh.min_y, result.mesh.max_y, result.mesh.lod);
            let handle = self.uploader.upload_terrain(result.mesh);
            if let Some(old) = chunk.mesh.replace(handle) {
                self.uploader.release(old);
            }
            chunk.min_y = min_y;
            chunk.max_y = max_y;
            chunk.lod = lod;
            // A stale-LOD result still applies (last write wins); aligning
            // the requested tier makes the next pass re-request the right
            // one instead of leaving the mismatch latent.
            chunk.requested_lod = lod;
        }
    }

    fn submit_build(&self, key: ChunkKey, lod: u8) {
        let builder = self.builder.clone();
        let sender = self.result_tx.clone();
        self.pipeline.submit(move || {
            let mesh = builder.build(key.x, key.z, lod);
            let _ = sender.send(BuildResult { key, mesh });
        });
    }

    /// Two-tier step function of Chebyshev distance from the viewpoint chunk.
    fn select_lod(&self, dx: i32, dz: i32) -> u8 {
        let distance = dx.unsigned_abs().max(dz.unsigned_abs());
        if distance > self.lod_switch_distance {
            LOD_COARSE
        } else {
            LOD_FINE
        }
    }
}

impl<U: MeshUpload> Drop for ChunkStore<U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
