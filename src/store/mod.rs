//! # Resource Store
//!
//! Abstract interface over the cluster's object store.
//!
//! The sync executor only ever talks to a [`ResourceStore`]; the reconciliation
//! core never touches it. Every call is keyed by (kind, namespace, name) and
//! carries a single intent, so calls for different keys are independent.
//!
//! - `kubernetes`: implementation backed by the Kubernetes API via `kube`

use crate::resource::{Replicable, ResourceKind};
use async_trait::async_trait;
use kube::api::Preconditions;
use std::time::Duration;
use thiserror::Error;

pub mod kubernetes;

pub use kubernetes::KubeStore;

/// Errors returned by store operations
///
/// `NotFound` and `AlreadyExists` are control-flow signals the executor
/// branches on; everything else is a per-operation failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
    /// The name is taken by an object the replicator does not own
    #[error("{kind} {namespace}/{name} exists and is not a replica, refusing to overwrite")]
    NotAReplica {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("Kubernetes API error: {0}")]
    Kube(#[source] kube::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Classify a `kube` error for the object at `namespace/name`
    ///
    /// 404 becomes `NotFound`, 409 with reason `AlreadyExists` becomes
    /// `AlreadyExists`. A 409 `Conflict` (stale resourceVersion) stays a plain
    /// API error: the next pass re-reads and retries.
    pub fn from_kube(error: kube::Error, kind: ResourceKind, namespace: &str, name: &str) -> Self {
        match error {
            kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
                StoreError::AlreadyExists {
                    kind,
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }
            }
            other => StoreError::Kube(other),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// Store operations for one kind of replicable object
#[async_trait]
pub trait ResourceStore<K: Replicable>: Send + Sync {
    /// List every object of this kind across all namespaces
    async fn list_all(&self) -> Result<Vec<K>, StoreError>;

    /// Fetch a single object
    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError>;

    /// Create `resource` in `namespace`; `AlreadyExists` if the name is taken
    async fn create(&self, namespace: &str, resource: &K) -> Result<K, StoreError>;

    /// Replace the object in `namespace`, honouring its resourceVersion
    async fn update(&self, namespace: &str, resource: &K) -> Result<K, StoreError>;

    /// Delete an object; `NotFound` if it is already gone
    ///
    /// The delete only applies while the stored object still matches
    /// `preconditions` (uid and resourceVersion, when set).
    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        preconditions: &Preconditions,
    ) -> Result<(), StoreError>;
}

/// Lists namespace names once per scheduler tick
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;
}
