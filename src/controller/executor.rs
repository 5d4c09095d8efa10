//! # Sync Executor
//!
//! Applies planned operations to a [`ResourceStore`]. This is the only part of
//! the controller that writes.
//!
//! Operations run concurrently up to `max_concurrent_operations`; outcomes are
//! returned in plan order. Each store call is bounded by `operation_timeout`,
//! and a failed operation never stops the others.

use crate::constants::REPLICATED_FROM_ANNOTATION;
use crate::controller::annotations::annotation;
use crate::controller::classifier::{is_replica, is_source};
use crate::controller::equality::replicas_equal;
use crate::controller::planner::{apply_candidate, SyncAction, SyncOperation};
use crate::resource::Replicable;
use crate::store::{ResourceStore, StoreError};
use futures::stream::{self, StreamExt};
use kube::api::Preconditions;
use kube::ResourceExt;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Concurrency and deadline settings for one pass
#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    pub max_concurrent_operations: usize,
    pub operation_timeout: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            max_concurrent_operations: DEFAULT_MAX_CONCURRENT_OPERATIONS,
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

/// What a successful operation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    Created,
    Updated,
    /// Create raced with another writer and the stored object already matched
    Unchanged,
    Deleted,
    /// Delete target was already gone
    AlreadyDeleted,
}

/// Result of one planned operation
#[derive(Debug)]
pub struct OperationOutcome {
    pub action: SyncAction,
    pub namespace: String,
    pub name: String,
    pub source_namespace: String,
    pub result: Result<OperationStatus, StoreError>,
}

pub struct SyncExecutor<'a, K, S: ?Sized> {
    store: &'a S,
    settings: ExecutorSettings,
    kind: PhantomData<fn() -> K>,
}

impl<K: Replicable, S: ?Sized> std::fmt::Debug for SyncExecutor<'_, K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncExecutor")
            .field("kind", &K::KIND)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a, K, S> SyncExecutor<'a, K, S>
where
    K: Replicable,
    S: ResourceStore<K> + ?Sized,
{
    pub fn new(store: &'a S, settings: ExecutorSettings) -> Self {
        Self {
            store,
            settings,
            kind: PhantomData,
        }
    }

    /// Apply every operation and collect the outcomes in input order
    pub async fn execute(&self, operations: Vec<SyncOperation<K>>) -> Vec<OperationOutcome> {
        let concurrency = self.settings.max_concurrent_operations.max(1);
        stream::iter(operations)
            .map(|operation| self.apply(operation))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn apply(&self, operation: SyncOperation<K>) -> OperationOutcome {
        let action = operation.action();
        let namespace = operation.namespace().to_string();
        let name = operation.name().to_string();
        let source_namespace = operation.source_namespace().to_string();

        let result = match &operation {
            SyncOperation::Create { resource, .. } => {
                info!(
                    resource = %K::KIND,
                    namespace = %source_namespace,
                    name = %name,
                    target = %namespace,
                    "Replicating to {} namespace", namespace
                );
                self.create(&namespace, resource).await
            }
            SyncOperation::Update { resource, .. } => {
                info!(
                    resource = %K::KIND,
                    namespace = %source_namespace,
                    name = %name,
                    target = %namespace,
                    "Updating replica in {} namespace", namespace
                );
                self.call("update", self.store.update(&namespace, resource))
                    .await
                    .map(|_| OperationStatus::Updated)
            }
            SyncOperation::Delete { preconditions, .. } => {
                info!(
                    resource = %K::KIND,
                    namespace = %namespace,
                    name = %name,
                    "Deleting orphaned replica"
                );
                self.delete(&namespace, &name, preconditions).await
            }
        };

        if let Err(e) = &result {
            error!(
                resource = %K::KIND,
                action = %action,
                namespace = %namespace,
                name = %name,
                "Operation failed: {}", e
            );
        }

        OperationOutcome {
            action,
            namespace,
            name,
            source_namespace,
            result,
        }
    }

    /// Create the candidate; on a create race, adopt the stored object instead
    ///
    /// Only replicas are adopted. A plain object or a source holding the name
    /// is left alone and the operation fails with `NotAReplica`.
    async fn create(&self, namespace: &str, candidate: &K) -> Result<OperationStatus, StoreError> {
        match self.call("create", self.store.create(namespace, candidate)).await {
            Ok(_) => Ok(OperationStatus::Created),
            Err(e) if e.is_already_exists() => {
                let name = candidate.name_any();
                warn!(
                    resource = %K::KIND,
                    namespace = namespace,
                    name = %name,
                    "Name taken after the snapshot was taken, checking for an adoptable replica"
                );
                let existing = self.call("get", self.store.get(namespace, &name)).await?;
                if !is_replica(&existing) || is_source(&existing) {
                    return Err(StoreError::NotAReplica {
                        kind: K::KIND,
                        namespace: namespace.to_string(),
                        name,
                    });
                }
                let same_provenance = annotation(existing.meta(), REPLICATED_FROM_ANNOTATION)
                    == annotation(candidate.meta(), REPLICATED_FROM_ANNOTATION);
                if same_provenance && replicas_equal(candidate, &existing) {
                    return Ok(OperationStatus::Unchanged);
                }
                let updated = apply_candidate(&existing, candidate);
                self.call("update", self.store.update(namespace, &updated))
                    .await
                    .map(|_| OperationStatus::Updated)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        preconditions: &Preconditions,
    ) -> Result<OperationStatus, StoreError> {
        match self
            .call("delete", self.store.delete(namespace, name, preconditions))
            .await
        {
            Ok(()) => Ok(OperationStatus::Deleted),
            Err(e) if e.is_not_found() => {
                debug!(
                    resource = %K::KIND,
                    namespace = namespace,
                    name = name,
                    "Replica already deleted"
                );
                Ok(OperationStatus::AlreadyDeleted)
            }
            Err(e) => Err(e),
        }
    }

    /// Bound a single store call by the configured deadline
    async fn call<T>(
        &self,
        operation: &'static str,
        request: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.settings.operation_timeout, request).await {
            Ok(result) => result,
            Err(_elapsed) => Err(StoreError::Timeout {
                operation,
                timeout: self.settings.operation_timeout,
            }),
        }
    }
}
