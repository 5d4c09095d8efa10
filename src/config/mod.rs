//! # Configuration
//!
//! - `duration`: duration string parsing (`10s`, `1m30s`, ...)
//! - `replicator`: process settings from environment variables

pub mod duration;
pub mod replicator;

pub use duration::{parse_duration, DurationError};
pub use replicator::{ConfigError, LogFormat, ReplicatorConfig};
