//! # Constants
//!
//! Shared constants used throughout the replicator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Annotation on a source object: comma-separated regex patterns over namespace names
pub const REPLICATE_TO_ANNOTATION: &str = "resource-replicator/replicate-to";

/// Annotation on a source object: presence alone requests replication to every other namespace
pub const ALL_NAMESPACES_ANNOTATION: &str = "resource-replicator/all-namespaces";

/// Annotation on a replica: the namespace of the source it was copied from
pub const REPLICATED_FROM_ANNOTATION: &str = "resource-replicator/replicated-from";

/// Written by `kubectl apply`; never copied to replicas and never compared
pub const LAST_APPLIED_CONFIGURATION_ANNOTATION: &str =
    "kubectl.kubernetes.io/last-applied-configuration";

/// Annotations used for replication bookkeeping, excluded from equality checks
pub const CONTROL_ANNOTATIONS: [&str; 4] = [
    REPLICATE_TO_ANNOTATION,
    ALL_NAMESPACES_ANNOTATION,
    REPLICATED_FROM_ANNOTATION,
    LAST_APPLIED_CONFIGURATION_ANNOTATION,
];

/// Annotations removed from a source's annotation set before it is written as a replica
pub const STRIPPED_ON_REPLICATION: [&str; 3] = [
    REPLICATE_TO_ANNOTATION,
    ALL_NAMESPACES_ANNOTATION,
    LAST_APPLIED_CONFIGURATION_ANNOTATION,
];

/// Default interval between reconciliation ticks
pub const DEFAULT_LOOP_DURATION_SECS: u64 = 10;

/// Debug logging is on unless explicitly disabled
pub const DEFAULT_DEBUG: bool = true;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default upper bound on concurrent store writes within one pass
pub const DEFAULT_MAX_CONCURRENT_OPERATIONS: usize = 10;

/// Default deadline for a single store operation (seconds)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default log format (text, json)
pub const DEFAULT_LOG_FORMAT: &str = "text";
