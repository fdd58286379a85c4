//! Global tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::EngineError;

/// Build the filter: `RUST_LOG` when set and valid, otherwise the configured
/// level.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()))
}

/// Install the global fmt subscriber.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .try_init()
        .map_err(|e| EngineError::Logging(e.to_string()))?;
    tracing::debug!(level = config.directive(), "logging initialized");
    Ok(())
}
