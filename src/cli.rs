//! # Command Line
//!
//! Flags for the `resource-replicator` binary. Every flag is optional and,
//! when given, overrides the value loaded from the environment.
//!
//! ## Usage
//!
//! ```bash
//! # Run against the current kubeconfig context, ticking every 30 seconds
//! resource-replicator --loop-duration 30s
//!
//! # Use an explicit kubeconfig, quiet logs, single pass
//! resource-replicator --kubeconfig ~/.kube/staging --debug=false --once
//!
//! # Replicate ConfigMaps only
//! resource-replicator --no-secrets
//! ```

use crate::config::replicator::{parse_bool, parse_duration_field};
use crate::config::{ConfigError, LogFormat, ReplicatorConfig};
use clap::Parser;
use std::path::PathBuf;

/// Replicates annotated Secrets and ConfigMaps across namespaces
#[derive(Debug, Parser)]
#[command(name = "resource-replicator", version, about, long_about = None)]
pub struct Cli {
    /// Path to a kubeconfig file (defaults to KUBECONFIG, ~/.kube/config or in-cluster config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Interval between reconciliation passes (e.g. 10s, 1m30s)
    #[arg(long, alias = "configLoopDuration", value_name = "DURATION")]
    pub loop_duration: Option<String>,

    /// Enable debug logging; `--debug` alone means true
    #[arg(
        long,
        alias = "configDebug",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_bool_flag,
        value_name = "BOOL"
    )]
    pub debug: Option<bool>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Port for the metrics and health probe server
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Maximum concurrent writes per pass
    #[arg(long)]
    pub max_concurrent_operations: Option<usize>,

    /// Deadline for a single Kubernetes API call (e.g. 30s)
    #[arg(long, value_name = "DURATION")]
    pub operation_timeout: Option<String>,

    /// Do not replicate Secrets
    #[arg(long)]
    pub no_secrets: bool,

    /// Do not replicate ConfigMaps
    #[arg(long)]
    pub no_configmaps: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,
}

fn parse_bool_flag(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("expected a boolean, got '{value}'"))
}

impl Cli {
    /// Overlay the given flags on `config` and validate the result
    pub fn apply(self, mut config: ReplicatorConfig) -> Result<ReplicatorConfig, ConfigError> {
        if let Some(value) = self.loop_duration.as_deref() {
            config.loop_duration = parse_duration_field("loop duration", value)?;
        }
        if let Some(value) = self.operation_timeout.as_deref() {
            config.operation_timeout = parse_duration_field("operation timeout", value)?;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
        if let Some(max) = self.max_concurrent_operations {
            config.max_concurrent_operations = max;
        }
        if self.kubeconfig.is_some() {
            config.kubeconfig = self.kubeconfig;
        }
        if self.context.is_some() {
            config.context = self.context;
        }
        if self.no_secrets {
            config.replicate_secrets = false;
        }
        if self.no_configmaps {
            config.replicate_configmaps = false;
        }
        config.run_once = self.once;

        config.validate()?;
        Ok(config)
    }
}
