//! The world/streaming settings struct with defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings fixed at store construction for one generation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed; every sampler and placement draw derives from it.
    pub seed: i32,
    /// Chunk footprint edge length in world units.
    pub chunk_size: u32,
    /// Terrain streaming radius around the viewpoint, in chunks
    /// (Chebyshev distance).
    pub render_distance: u32,
    /// Feature streaming radius around the viewpoint, in chunks.
    pub feature_distance: u32,
    /// Chunks beyond this Chebyshev distance drop to the coarse LOD tier.
    pub lod_switch_distance: u32,
    /// Worker thread override; `None` sizes the pool to the machine
    /// (hardware threads minus one, at least one).
    pub worker_threads: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            chunk_size: 64,
            render_distance: 4,
            feature_distance: 3,
            lod_switch_distance: 2,
            worker_threads: None,
        }
    }
}

impl WorldConfig {
    /// Check every setting the engine cannot tolerate at zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_size",
                reason: "must be at least 1",
            });
        }
        if self.render_distance == 0 {
            return Err(ConfigError::Invalid {
                field: "render_distance",
                reason: "must be at least 1",
            });
        }
        if self.feature_distance == 0 {
            return Err(ConfigError::Invalid {
                field: "feature_distance",
                reason: "must be at least 1",
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "override must be at least 1",
            });
        }
        Ok(())
    }

    /// Load and validate a config from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config: Self = ron::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist the config as pretty-printed RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }
}
