//! # Controller
//!
//! The reconciliation core. Everything here except the executor is pure and
//! works on a snapshot handed in by the caller.
//!
//! - `annotations`: annotation lookup and replica annotation construction
//! - `resolver`: expands replication intent into target namespaces
//! - `classifier`: splits a snapshot into sources and replicas
//! - `equality`: replica comparison ignoring control annotations
//! - `planner`: create/update/no-op decisions per (source, target)
//! - `orphans`: delete decisions for unclaimed replicas
//! - `reconciler`: the pure `reconcile` function and the async `run_pass`
//! - `executor`: applies operations to a `ResourceStore`
//! - `report`: per-pass summary
//! - `error`: core error types

pub mod annotations;
pub mod classifier;
pub mod equality;
pub mod error;
pub mod executor;
pub mod orphans;
pub mod planner;
pub mod reconciler;
pub mod report;
pub mod resolver;

pub use classifier::{classify, Classification, ReplicaResource, SourceResource};
pub use equality::replicas_equal;
pub use error::{InvalidPattern, ReplicatorError};
pub use executor::{ExecutorSettings, OperationOutcome, OperationStatus, SyncExecutor};
pub use orphans::detect_orphans;
pub use planner::{build_candidate, plan_replication, ReplicationPlan, SyncAction, SyncOperation};
pub use reconciler::{reconcile, run_pass, ReconcilePlan};
pub use report::{OperationFailure, PassReport};
pub use resolver::{resolve_target_namespaces, TargetResolution};
