//! Structured logging bootstrap via the `tracing` ecosystem.
//!
//! Console output with uptime timestamps, module targets, and worker thread
//! names, filterable through `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the process-wide tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level_override` (or `info`) is
/// used as the filter. Calling this more than once is harmless: later calls
/// leave the first subscriber installed.
pub fn init_logging(level_override: Option<&str>) {
    let default_filter = level_override.unwrap_or("info");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_logging(Some("debug"));
        init_logging(None);
        tracing::info!("logging initialized twice without incident");
    }
}
