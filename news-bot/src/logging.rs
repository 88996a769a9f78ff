//! Logging initialization.

use tracing_subscriber::EnvFilter;

use crate::types::{NewsError, Result};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
/// Logs go to stderr so they never interleave with interactive menus.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| NewsError::Config(format!("invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| NewsError::Config(format!("logging already initialized: {}", e)))
}
