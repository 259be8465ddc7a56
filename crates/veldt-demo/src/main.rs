//! Headless streaming demo: flies a viewpoint across the terrain and logs
//! chunk churn and upload statistics.
//!
//! Run with `cargo run -p veldt-demo`, or override settings on the command
//! line: `cargo run -p veldt-demo -- --seed 7 --render-distance 6`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use tracing::info;
use veldt_config::{CliArgs, ConfigError, WorldConfig};
use veldt_log::init_logging;
use veldt_mesh::NullUpload;
use veldt_stream::{ChunkStore, FeatureStore};
use veldt_terrain::TerrainSampler;

#[derive(Debug, Parser)]
#[command(name = "veldt-demo", about = "Headless terrain streaming demo")]
struct DemoArgs {
    /// Path to a RON world config; defaults apply when the file is absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Viewpoint speed in world units per frame.
    #[arg(long, default_value_t = 1.5)]
    speed: f32,

    #[command(flatten)]
    overrides: CliArgs,
}

fn main() -> Result<(), ConfigError> {
    let args = DemoArgs::parse();
    init_logging(None);

    let mut config = match &args.config {
        Some(path) => WorldConfig::load_or_default(path)?,
        None => WorldConfig::default(),
    };
    args.overrides.apply(&mut config);
    config.validate()?;
    info!(?config, frames = args.frames, "starting terrain stream");

    let sampler = TerrainSampler::new(config.seed);
    let mut terrain = ChunkStore::new(&config, sampler.clone(), NullUpload::default())?;
    let mut features = FeatureStore::new(&config, sampler, NullUpload::default())?;

    let mut viewpoint = Vec3::new(0.0, 18.0, 32.0);
    let start = Instant::now();

    for frame in 0..args.frames {
        viewpoint.x += args.speed;
        terrain.update(viewpoint);
        features.update(viewpoint);

        if frame % 120 == 0 {
            let ready = terrain.chunks().filter(|chunk| chunk.is_ready()).count();
            info!(
                frame,
                live = terrain.len(),
                ready,
                pending_builds = terrain.in_flight(),
                feature_chunks = features.len(),
                "streaming"
            );
        }
        // Stand-in for the frame budget the renderer would spend drawing.
        std::thread::sleep(Duration::from_millis(5));
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        terrain_uploads = terrain.uploader().uploads(),
        terrain_releases = terrain.uploader().releases(),
        terrain_vertices = terrain.uploader().vertices_uploaded(),
        feature_uploads = features.uploader().uploads(),
        feature_releases = features.uploader().releases(),
        "stream finished"
    );

    terrain.shutdown();
    features.shutdown();
    Ok(())
}
