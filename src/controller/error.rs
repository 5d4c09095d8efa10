//! # Errors
//!
//! Error types raised by the reconciliation core.

use crate::resource::ResourceKind;
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// A resource was resolved as a source without carrying either intent annotation
    #[error(
        "neither resource-replicator/replicate-to nor resource-replicator/all-namespaces annotation found on {namespace}/{name}"
    )]
    MissingAnnotation { namespace: String, name: String },
    /// Listing every object of a kind failed; the pass for that kind is aborted
    #[error("failed to list {kind} objects: {source}")]
    ListFailed {
        kind: ResourceKind,
        #[source]
        source: StoreError,
    },
}

/// A `replicate-to` pattern that does not compile
///
/// Only the offending pattern is skipped; the rest of the source's patterns
/// still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid replicate-to pattern '{pattern}' on {namespace}/{name}: {message}")]
pub struct InvalidPattern {
    pub namespace: String,
    pub name: String,
    pub pattern: String,
    pub message: String,
}
