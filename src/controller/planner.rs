//! # Replication Planner
//!
//! Decides, for every (source, target namespace) pair, whether the replica
//! must be created, updated, or left alone.
//!
//! ## Planning Flow
//!
//! 1. Build the candidate replica from the source (fresh metadata, provenance
//!    annotation set, intent annotations removed)
//! 2. Look up the existing replica by (name, provenance namespace, namespace)
//! 3. Missing → create; present but different → update; present and equal → no-op

use crate::controller::annotations::replica_annotations;
use crate::controller::classifier::{ReplicaResource, SourceResource};
use crate::controller::equality::replicas_equal;
use crate::resource::Replicable;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::Preconditions;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Kind of write the executor performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

impl SyncAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One store write, keyed by the namespace/name it touches
#[derive(Debug, Clone)]
pub enum SyncOperation<K> {
    /// Write a new replica
    Create { source_namespace: String, resource: K },
    /// Replace an existing replica; `resource` keeps the stored resourceVersion
    Update { source_namespace: String, resource: K },
    /// Remove an orphaned replica
    Delete {
        source_namespace: String,
        namespace: String,
        name: String,
        /// uid and resourceVersion of the replica as listed
        preconditions: Preconditions,
    },
}

impl<K: Replicable> SyncOperation<K> {
    pub fn action(&self) -> SyncAction {
        match self {
            SyncOperation::Create { .. } => SyncAction::Create,
            SyncOperation::Update { .. } => SyncAction::Update,
            SyncOperation::Delete { .. } => SyncAction::Delete,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SyncOperation::Create { resource, .. } | SyncOperation::Update { resource, .. } => {
                resource.meta().namespace.as_deref().unwrap_or_default()
            }
            SyncOperation::Delete { namespace, .. } => namespace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SyncOperation::Create { resource, .. } | SyncOperation::Update { resource, .. } => {
                resource.meta().name.as_deref().unwrap_or_default()
            }
            SyncOperation::Delete { name, .. } => name,
        }
    }

    pub fn source_namespace(&self) -> &str {
        match self {
            SyncOperation::Create {
                source_namespace, ..
            }
            | SyncOperation::Update {
                source_namespace, ..
            }
            | SyncOperation::Delete {
                source_namespace, ..
            } => source_namespace,
        }
    }
}

/// Writes needed to bring every source's replicas up to date
#[derive(Debug)]
pub struct ReplicationPlan<K> {
    pub operations: Vec<SyncOperation<K>>,
    /// Replicas that already match their source
    pub unchanged: usize,
}

/// Build the object that should exist in `target_namespace` for `source`
///
/// Payload and kind-specific fields are copied from the source. Metadata is
/// fresh: no resourceVersion, uid or owner references.
pub fn build_candidate<K: Replicable>(source: &K, target_namespace: &str) -> K {
    let source_meta = source.meta();
    let source_namespace = source_meta.namespace.as_deref().unwrap_or_default();

    let mut candidate = source.clone();
    *candidate.meta_mut() = ObjectMeta {
        name: source_meta.name.clone(),
        namespace: Some(target_namespace.to_string()),
        labels: source_meta.labels.clone(),
        annotations: Some(replica_annotations(
            source_meta.annotations.as_ref(),
            source_namespace,
        )),
        ..ObjectMeta::default()
    };
    candidate
}

/// Overlay the candidate's payload, labels and annotations on a stored replica
///
/// The stored object's identity and resourceVersion are kept so the write is
/// an optimistic-concurrency update.
pub fn apply_candidate<K: Replicable>(existing: &K, candidate: &K) -> K {
    let mut updated = existing.clone();
    updated.copy_payload_from(candidate);
    let meta = updated.meta_mut();
    meta.labels.clone_from(&candidate.meta().labels);
    meta.annotations.clone_from(&candidate.meta().annotations);
    updated
}

pub fn plan_replication<K: Replicable>(
    sources: &[SourceResource<K>],
    replicas: &[ReplicaResource<K>],
) -> ReplicationPlan<K> {
    let existing: HashMap<(&str, &str, &str), &K> = replicas
        .iter()
        .map(|replica| {
            (
                (
                    replica.name(),
                    replica.source_namespace.as_str(),
                    replica.namespace(),
                ),
                &replica.resource,
            )
        })
        .collect();

    let mut operations = Vec::new();
    let mut unchanged = 0usize;

    for source in sources {
        for target in &source.target_namespaces {
            if target == source.namespace() {
                continue;
            }
            let candidate = build_candidate(&source.resource, target);
            let source_namespace = source.namespace().to_string();

            match existing.get(&(source.name(), source.namespace(), target.as_str())) {
                None => operations.push(SyncOperation::Create {
                    source_namespace,
                    resource: candidate,
                }),
                Some(current) if !replicas_equal(&candidate, current) => {
                    operations.push(SyncOperation::Update {
                        source_namespace,
                        resource: apply_candidate(current, &candidate),
                    });
                }
                Some(_) => unchanged += 1,
            }
        }
        debug!(
            resource = %K::KIND,
            namespace = source.namespace(),
            name = source.name(),
            targets = source.target_namespaces.len(),
            "Planned replication for source"
        );
    }

    ReplicationPlan {
        operations,
        unchanged,
    }
}
