//! # Observability
//!
//! - `metrics`: Prometheus metrics collection
//! - `logging`: `tracing` subscriber setup

pub mod logging;
pub mod metrics;

pub use metrics::{
    increment_namespace_list_failures, increment_pass_failures, record_pass, register_metrics,
};
