//! # Reconciler
//!
//! One reconciliation pass for one kind of object.
//!
//! [`reconcile`] is pure: given a snapshot of every object of the kind and the
//! namespace list, it returns the writes that bring the cluster in line with
//! the sources' intent. [`run_pass`] lists the snapshot, hands the plan to the
//! [`SyncExecutor`] and folds the outcomes into a [`PassReport`].
//!
//! ## Reconciliation Flow
//!
//! 1. Classify the snapshot into sources and replicas
//! 2. Plan creates and updates for every (source, target namespace) pair
//! 3. Plan deletes for every replica no source claims
//! 4. Drop deletes of objects a create in the same plan will adopt
//! 5. Execute (`run_pass` only)

use crate::controller::classifier::classify;
use crate::controller::error::{InvalidPattern, ReplicatorError};
use crate::controller::executor::{ExecutorSettings, SyncExecutor};
use crate::controller::orphans::detect_orphans;
use crate::controller::planner::{plan_replication, SyncAction, SyncOperation};
use crate::controller::report::PassReport;
use crate::resource::{Replicable, ResourceKind};
use crate::store::{ResourceStore, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Every write needed for one kind, plus counters for the pass report
#[derive(Debug)]
pub struct ReconcilePlan<K> {
    pub kind: ResourceKind,
    /// Creates and updates in source/target order, followed by deletes
    pub operations: Vec<SyncOperation<K>>,
    pub sources: usize,
    pub replicas: usize,
    pub unchanged: usize,
    pub invalid_patterns: Vec<InvalidPattern>,
}

impl<K: Replicable> ReconcilePlan<K> {
    /// Number of planned operations of `action`
    pub fn count(&self, action: SyncAction) -> usize {
        self.operations
            .iter()
            .filter(|op| op.action() == action)
            .count()
    }
}

/// Compute the writes for one snapshot
///
/// A replica whose provenance no longer matches but whose name and namespace
/// are targeted by a live source is not deleted: the planned create hits
/// `AlreadyExists` and the executor takes the object over instead.
pub fn reconcile<K: Replicable>(snapshot: Vec<K>, namespaces: &[String]) -> ReconcilePlan<K> {
    let classification = classify(snapshot, namespaces);
    let plan = plan_replication(&classification.sources, &classification.replicas);
    let orphans = detect_orphans(&classification.sources, &classification.replicas);

    let created: HashSet<(&str, &str)> = plan
        .operations
        .iter()
        .filter(|op| op.action() == SyncAction::Create)
        .map(|op| (op.namespace(), op.name()))
        .collect();

    let (adopted, deletes): (Vec<_>, Vec<_>) = orphans
        .into_iter()
        .partition(|op| created.contains(&(op.namespace(), op.name())));
    for op in &adopted {
        debug!(
            resource = %K::KIND,
            namespace = op.namespace(),
            name = op.name(),
            previous_source_namespace = op.source_namespace(),
            "Replica will be adopted by a new source instead of deleted"
        );
    }

    let mut operations = plan.operations;
    operations.extend(deletes);

    ReconcilePlan {
        kind: K::KIND,
        operations,
        sources: classification.sources.len(),
        replicas: classification.replicas.len(),
        unchanged: plan.unchanged,
        invalid_patterns: classification.invalid_patterns,
    }
}

/// List, reconcile and execute one kind against `store`
///
/// Fails only when the snapshot cannot be listed. Individual write failures
/// are collected in [`PassReport::failures`].
pub async fn run_pass<K, S>(
    store: &S,
    namespaces: &[String],
    settings: ExecutorSettings,
) -> Result<PassReport, ReplicatorError>
where
    K: Replicable,
    S: ResourceStore<K> + ?Sized,
{
    let span = info_span!("replicator.pass", resource = %K::KIND);
    async move {
        let started_at = Utc::now();
        let start = Instant::now();

        let snapshot = list_snapshot::<K, S>(store, settings).await?;
        let plan = reconcile(snapshot, namespaces);
        debug!(
            resource = %K::KIND,
            create = plan.count(SyncAction::Create),
            update = plan.count(SyncAction::Update),
            delete = plan.count(SyncAction::Delete),
            unchanged = plan.unchanged,
            "Planned pass"
        );

        let mut report = PassReport::new(K::KIND, started_at);
        report.sources = plan.sources;
        report.replicas = plan.replicas;
        report.unchanged = plan.unchanged;
        report.invalid_patterns = plan.invalid_patterns;

        let outcomes = SyncExecutor::new(store, settings)
            .execute(plan.operations)
            .await;
        for outcome in outcomes {
            report.record(outcome);
        }
        report.duration_seconds = start.elapsed().as_secs_f64();

        if report.is_clean() {
            info!(
                resource = %K::KIND,
                sources = report.sources,
                replicas = report.replicas,
                created = report.created,
                updated = report.updated,
                deleted = report.deleted,
                already_deleted = report.already_deleted,
                unchanged = report.unchanged,
                duration_seconds = report.duration_seconds,
                "Pass complete"
            );
        } else {
            warn!(
                resource = %K::KIND,
                sources = report.sources,
                created = report.created,
                updated = report.updated,
                deleted = report.deleted,
                failures = report.failures.len(),
                invalid_patterns = report.invalid_patterns.len(),
                duration_seconds = report.duration_seconds,
                "Pass completed with errors"
            );
        }

        Ok(report)
    }
    .instrument(span)
    .await
}

async fn list_snapshot<K, S>(store: &S, settings: ExecutorSettings) -> Result<Vec<K>, ReplicatorError>
where
    K: Replicable,
    S: ResourceStore<K> + ?Sized,
{
    let listed = match tokio::time::timeout(settings.operation_timeout, store.list_all()).await {
        Ok(result) => result,
        Err(_elapsed) => Err(StoreError::Timeout {
            operation: "list",
            timeout: settings.operation_timeout,
        }),
    };
    listed.map_err(|source| ReplicatorError::ListFailed {
        kind: K::KIND,
        source,
    })
}
