//! Command-line overrides for [`WorldConfig`] fields.

use crate::config::WorldConfig;

/// Optional per-field overrides, flattened into a binary's own parser.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CliArgs {
    /// Override the world seed.
    #[arg(long)]
    pub seed: Option<i32>,

    /// Override the chunk footprint size in world units.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Override the terrain streaming radius in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Override the feature streaming radius in chunks.
    #[arg(long)]
    pub feature_distance: Option<u32>,

    /// Override the LOD switch distance in chunks.
    #[arg(long)]
    pub lod_switch_distance: Option<u32>,

    /// Override the worker pool size.
    #[arg(long)]
    pub worker_threads: Option<usize>,
}

impl CliArgs {
    /// Apply every present override onto `config`.
    pub fn apply(&self, config: &mut WorldConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(render_distance) = self.render_distance {
            config.render_distance = render_distance;
        }
        if let Some(feature_distance) = self.feature_distance {
            config.feature_distance = feature_distance;
        }
        if let Some(lod_switch_distance) = self.lod_switch_distance {
            config.lod_switch_distance = lod_switch_distance;
        }
        if let Some(worker_threads) = self.worker_threads {
            config.worker_threads = Some(worker_threads);
        }
    }
}
