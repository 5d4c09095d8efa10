//! # Pass Report
//!
//! Structured summary of one reconciliation pass for one kind.

use crate::controller::error::InvalidPattern;
use crate::controller::executor::{OperationOutcome, OperationStatus};
use crate::controller::planner::SyncAction;
use crate::resource::ResourceKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One operation that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    pub action: SyncAction,
    pub namespace: String,
    pub name: String,
    pub source_namespace: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub kind: ResourceKind,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub sources: usize,
    pub replicas: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Orphans another actor removed before our delete landed
    pub already_deleted: usize,
    pub unchanged: usize,
    pub invalid_patterns: Vec<InvalidPattern>,
    pub failures: Vec<OperationFailure>,
}

impl PassReport {
    #[must_use]
    pub fn new(kind: ResourceKind, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            started_at,
            duration_seconds: 0.0,
            sources: 0,
            replicas: 0,
            created: 0,
            updated: 0,
            deleted: 0,
            already_deleted: 0,
            unchanged: 0,
            invalid_patterns: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Fold one executor outcome into the counters
    pub fn record(&mut self, outcome: OperationOutcome) {
        match outcome.result {
            Ok(OperationStatus::Created) => self.created += 1,
            Ok(OperationStatus::Updated) => self.updated += 1,
            Ok(OperationStatus::Unchanged) => self.unchanged += 1,
            Ok(OperationStatus::Deleted) => self.deleted += 1,
            Ok(OperationStatus::AlreadyDeleted) => self.already_deleted += 1,
            Err(e) => self.failures.push(OperationFailure {
                action: outcome.action,
                namespace: outcome.namespace,
                name: outcome.name,
                source_namespace: outcome.source_namespace,
                error: e.to_string(),
            }),
        }
    }

    /// No failed operations and no invalid patterns
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.invalid_patterns.is_empty()
    }

    /// Successful writes performed by the pass
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}
