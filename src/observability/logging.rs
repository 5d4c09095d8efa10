//! # Logging
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` wins when set;
//! otherwise the filter follows the `debug` setting.

use crate::config::{LogFormat, ReplicatorConfig};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn env_filter(config: &ReplicatorConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_log_filter().into())
}

/// Install the subscriber for the process
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &ReplicatorConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));
    match config.log_format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logging: {e}")),
        LogFormat::Text => builder
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}")),
    }
}
