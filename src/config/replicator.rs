//! # Replicator Configuration
//!
//! Process-level settings loaded from environment variables.
//!
//! Unset or unparseable variables fall back to their defaults. Command-line
//! flags are applied on top by [`crate::cli::Cli::apply`], after which the
//! result is validated once and never changes for the life of the process.

use crate::config::duration::{parse_duration, DurationError};
use crate::controller::ExecutorSettings;
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: DurationError,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("at least one of secrets or configmaps must be replicated")]
    NoKindsSelected,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatorConfig {
    /// Interval between reconciliation ticks
    pub loop_duration: Duration,
    /// Debug-level logging for the replicator's own targets
    pub debug: bool,
    /// Explicit kubeconfig file; inferred from the environment when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; the current context when unset
    pub context: Option<String>,
    pub log_format: LogFormat,
    pub metrics_port: u16,
    pub enable_metrics: bool,
    /// Upper bound on concurrent store writes within one pass
    pub max_concurrent_operations: usize,
    /// Deadline for a single store call
    pub operation_timeout: Duration,
    pub replicate_secrets: bool,
    pub replicate_configmaps: bool,
    /// Run a single tick and exit
    pub run_once: bool,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            loop_duration: Duration::from_secs(DEFAULT_LOOP_DURATION_SECS),
            debug: DEFAULT_DEBUG,
            kubeconfig: None,
            context: None,
            log_format: LogFormat::default(),
            metrics_port: DEFAULT_METRICS_PORT,
            enable_metrics: true,
            max_concurrent_operations: DEFAULT_MAX_CONCURRENT_OPERATIONS,
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
            replicate_secrets: true,
            replicate_configmaps: true,
            run_once: false,
        }
    }
}

impl ReplicatorConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            loop_duration: var_or_default_duration(
                &lookup,
                "CONFIG_LOOP_DURATION",
                defaults.loop_duration,
            ),
            debug: var_or_default_bool(&lookup, "CONFIG_DEBUG", defaults.debug),
            kubeconfig: None,
            context: None,
            log_format: var_or_default(&lookup, "LOG_FORMAT", defaults.log_format),
            metrics_port: var_or_default(&lookup, "METRICS_PORT", defaults.metrics_port),
            enable_metrics: var_or_default_bool(&lookup, "ENABLE_METRICS", defaults.enable_metrics),
            max_concurrent_operations: var_or_default(
                &lookup,
                "MAX_CONCURRENT_OPERATIONS",
                defaults.max_concurrent_operations,
            ),
            operation_timeout: var_or_default_duration(
                &lookup,
                "OPERATION_TIMEOUT",
                defaults.operation_timeout,
            ),
            replicate_secrets: var_or_default_bool(
                &lookup,
                "REPLICATE_SECRETS",
                defaults.replicate_secrets,
            ),
            replicate_configmaps: var_or_default_bool(
                &lookup,
                "REPLICATE_CONFIGMAPS",
                defaults.replicate_configmaps,
            ),
            run_once: defaults.run_once,
        }
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_duration.is_zero() {
            return Err(ConfigError::Zero {
                field: "loop duration",
            });
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "operation timeout",
            });
        }
        if self.max_concurrent_operations == 0 {
            return Err(ConfigError::Zero {
                field: "max concurrent operations",
            });
        }
        if !self.replicate_secrets && !self.replicate_configmaps {
            return Err(ConfigError::NoKindsSelected);
        }
        Ok(())
    }

    #[must_use]
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            max_concurrent_operations: self.max_concurrent_operations,
            operation_timeout: self.operation_timeout,
        }
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "resource_replicator=debug"
        } else {
            "resource_replicator=info"
        }
    }
}

/// Parse a boolean the way the env and CLI layers both accept it
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read variable or return default value
fn var_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read variable as boolean or return default
fn var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(default)
}

/// Read variable as duration or return default
///
/// A value that parses to zero also falls back to the default.
fn var_or_default_duration<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| parse_duration(&v).ok())
        .filter(|d| !d.is_zero())
        .unwrap_or(default)
}

/// Parse a duration flag value, naming the field on failure
pub fn parse_duration_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|source| ConfigError::InvalidDuration { field, source })
}
