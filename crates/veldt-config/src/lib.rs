//! Construction-time configuration for the terrain streaming core.
//!
//! Settings persist as RON files and can be overridden from the command
//! line. Validation happens up front: a store constructed from an invalid
//! configuration fails fast instead of misbehaving later.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::WorldConfig;
pub use error::ConfigError;
