// THEORY:
// The library only emits `tracing` events; it never installs a subscriber on its own.
// Binaries call `init_logging` once at startup. The filter is resolved in this order:
// `CVD_LOG`, then `RUST_LOG`, then the configured level.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CVD_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directives, e.g. `info` or `cvd_recolor=debug`.
    pub level: String,
    /// Emit newline-delimited JSON instead of compact text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Parse filter directives without consulting the environment.
pub fn filter_from_directives(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| EngineError::Logging(e.to_string()))
}

pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| config.level.clone());
    filter_from_directives(&directives)
}

/// Install the global subscriber (stderr). A second call returns an error.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = create_env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| EngineError::Logging(e.to_string()))
}
