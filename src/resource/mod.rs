//! # Replicable Resources
//!
//! The capability shared by every object kind the replicator copies between
//! namespaces. Classification, namespace resolution, planning and orphan
//! detection are written once against [`Replicable`]; each kind contributes a
//! thin adapter that knows where its payload lives.
//!
//! - `secret`: `Secret` adapter (`data`)
//! - `configmap`: `ConfigMap` adapter (`data` and `binaryData`)

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub mod configmap;
pub mod secret;

/// Kind of object being replicated
///
/// Used for log fields and metric labels. Each kind is reconciled by its own
/// independent pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Secret,
    ConfigMap,
}

impl ResourceKind {
    /// Lowercase name used in logs and metric labels
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Secret => "secret",
            ResourceKind::ConfigMap => "configmap",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced object with a key/value payload, labels and annotations that
/// can be copied into other namespaces.
///
/// Metadata access (name, namespace, labels, annotations, resourceVersion)
/// comes from [`kube::Resource`]; implementors only describe the payload.
pub trait Replicable:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// Kind tag for logs and metrics
    const KIND: ResourceKind;

    /// Byte-exact payload comparison, key by key
    fn payload_eq(&self, other: &Self) -> bool;

    /// Overwrite this object's payload with `other`'s
    fn copy_payload_from(&mut self, other: &Self);
}

/// Compare two optional maps, treating an absent map as empty.
///
/// The API server omits empty maps, so `None` and `Some({})` must compare equal
/// or replicas would be rewritten on every pass.
pub fn optional_maps_eq<V: PartialEq>(
    left: Option<&BTreeMap<String, V>>,
    right: Option<&BTreeMap<String, V>>,
) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l == r,
        (Some(m), None) | (None, Some(m)) => m.is_empty(),
        (None, None) => true,
    }
}
