//! # Metrics
//!
//! Prometheus metrics for monitoring the replicator.
//!
//! ## Metrics Exposed
//!
//! - `resource_replicator_passes_total` - Passes completed, by kind
//! - `resource_replicator_pass_failures_total` - Passes aborted because the kind could not be listed
//! - `resource_replicator_pass_duration_seconds` - Duration of completed passes
//! - `resource_replicator_operations_total` - Successful writes, by kind and action
//! - `resource_replicator_operation_failures_total` - Failed writes, by kind and action
//! - `resource_replicator_sources` - Sources seen in the last pass
//! - `resource_replicator_replicas` - Replicas seen in the last pass
//! - `resource_replicator_invalid_patterns_total` - `replicate-to` patterns that failed to compile
//! - `resource_replicator_namespace_list_failures_total` - Ticks skipped because namespaces could not be listed

use crate::controller::{PassReport, SyncAction};
use crate::resource::ResourceKind;
use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static PASSES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "resource_replicator_passes_total",
            "Total number of completed reconciliation passes",
        ),
        &["kind"],
    )
    .expect("Failed to create PASSES_TOTAL metric - this should never happen")
});

static PASS_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "resource_replicator_pass_failures_total",
            "Total number of passes aborted before planning",
        ),
        &["kind"],
    )
    .expect("Failed to create PASS_FAILURES_TOTAL metric - this should never happen")
});

static PASS_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "resource_replicator_pass_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create PASS_DURATION metric - this should never happen")
});

static OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "resource_replicator_operations_total",
            "Total number of successful replica writes",
        ),
        &["kind", "action"],
    )
    .expect("Failed to create OPERATIONS_TOTAL metric - this should never happen")
});

static OPERATION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "resource_replicator_operation_failures_total",
            "Total number of failed replica writes",
        ),
        &["kind", "action"],
    )
    .expect("Failed to create OPERATION_FAILURES_TOTAL metric - this should never happen")
});

static SOURCES: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "resource_replicator_sources",
            "Number of source objects seen in the last pass",
        ),
        &["kind"],
    )
    .expect("Failed to create SOURCES metric - this should never happen")
});

static REPLICAS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "resource_replicator_replicas",
            "Number of replica objects seen in the last pass",
        ),
        &["kind"],
    )
    .expect("Failed to create REPLICAS metric - this should never happen")
});

static INVALID_PATTERNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "resource_replicator_invalid_patterns_total",
            "Total number of replicate-to patterns that failed to compile",
        ),
        &["kind"],
    )
    .expect("Failed to create INVALID_PATTERNS_TOTAL metric - this should never happen")
});

static NAMESPACE_LIST_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "resource_replicator_namespace_list_failures_total",
        "Total number of ticks skipped because namespaces could not be listed",
    )
    .expect("Failed to create NAMESPACE_LIST_FAILURES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(PASSES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PASS_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PASS_DURATION.clone()))?;
    REGISTRY.register(Box::new(OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OPERATION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SOURCES.clone()))?;
    REGISTRY.register(Box::new(REPLICAS.clone()))?;
    REGISTRY.register(Box::new(INVALID_PATTERNS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NAMESPACE_LIST_FAILURES_TOTAL.clone()))?;

    Ok(())
}

/// Record the outcome of a completed pass
#[allow(clippy::cast_possible_wrap, reason = "object counts fit in i64")]
pub fn record_pass(report: &PassReport) {
    let kind = report.kind.as_str();

    PASSES_TOTAL.with_label_values(&[kind]).inc();
    PASS_DURATION
        .with_label_values(&[kind])
        .observe(report.duration_seconds);
    SOURCES.with_label_values(&[kind]).set(report.sources as i64);
    REPLICAS.with_label_values(&[kind]).set(report.replicas as i64);

    for (action, count) in [
        (SyncAction::Create, report.created),
        (SyncAction::Update, report.updated),
        (SyncAction::Delete, report.deleted),
    ] {
        OPERATIONS_TOTAL
            .with_label_values(&[kind, action.as_str()])
            .inc_by(count as u64);
    }
    for failure in &report.failures {
        OPERATION_FAILURES_TOTAL
            .with_label_values(&[kind, failure.action.as_str()])
            .inc();
    }
    INVALID_PATTERNS_TOTAL
        .with_label_values(&[kind])
        .inc_by(report.invalid_patterns.len() as u64);
}

pub fn increment_pass_failures(kind: ResourceKind) {
    PASS_FAILURES_TOTAL.with_label_values(&[kind.as_str()]).inc();
}

pub fn increment_namespace_list_failures() {
    NAMESPACE_LIST_FAILURES_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::OperationFailure;
    use chrono::Utc;

    // Metric statics are process-wide; each test uses its own kind or reads deltas.

    #[test]
    fn test_record_pass_updates_counters_and_gauges() {
        let mut report = PassReport::new(ResourceKind::Secret, Utc::now());
        report.sources = 3;
        report.replicas = 5;
        report.created = 2;
        report.deleted = 1;
        report.failures.push(OperationFailure {
            action: SyncAction::Update,
            namespace: "team-b".to_string(),
            name: "db".to_string(),
            source_namespace: "team-a".to_string(),
            error: "boom".to_string(),
        });

        let created_before = OPERATIONS_TOTAL
            .with_label_values(&["secret", "create"])
            .get();
        let failed_before = OPERATION_FAILURES_TOTAL
            .with_label_values(&["secret", "update"])
            .get();

        record_pass(&report);

        assert_eq!(SOURCES.with_label_values(&["secret"]).get(), 3);
        assert_eq!(REPLICAS.with_label_values(&["secret"]).get(), 5);
        assert_eq!(
            OPERATIONS_TOTAL
                .with_label_values(&["secret", "create"])
                .get(),
            created_before + 2
        );
        assert_eq!(
            OPERATION_FAILURES_TOTAL
                .with_label_values(&["secret", "update"])
                .get(),
            failed_before + 1
        );
    }

    #[test]
    fn test_failure_counters_increment() {
        let before = PASS_FAILURES_TOTAL.with_label_values(&["configmap"]).get();
        increment_pass_failures(ResourceKind::ConfigMap);
        assert_eq!(
            PASS_FAILURES_TOTAL.with_label_values(&["configmap"]).get(),
            before + 1
        );

        let before = NAMESPACE_LIST_FAILURES_TOTAL.get();
        increment_namespace_list_failures();
        assert_eq!(NAMESPACE_LIST_FAILURES_TOTAL.get(), before + 1);
    }
}
