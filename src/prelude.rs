//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use resource_replicator::prelude::*;
//! ```

pub use crate::config::{ConfigError, LogFormat, ReplicatorConfig};
pub use crate::controller::{
    reconcile, run_pass, ExecutorSettings, InvalidPattern, PassReport, ReconcilePlan,
    ReplicatorError, SyncAction, SyncOperation,
};
pub use crate::resource::{Replicable, ResourceKind};
pub use crate::store::{KubeStore, NamespaceLister, ResourceStore, StoreError};
