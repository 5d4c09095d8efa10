//! # Resource Replicator
//!
//! A Kubernetes controller that keeps copies of annotated `Secret` and
//! `ConfigMap` objects synchronized across namespaces and prunes copies whose
//! source no longer asks for them.
//!
//! ## Overview
//!
//! Sources opt in with an annotation:
//!
//! - `resource-replicator/replicate-to: "team-.*,shared"` replicates to every
//!   namespace matching any of the comma-separated regex patterns
//! - `resource-replicator/all-namespaces: ""` replicates to every namespace
//!
//! Each copy carries `resource-replicator/replicated-from: <source namespace>`.
//! A copy is deleted as soon as no source claims it any more.
//!
//! ## Layout
//!
//! - [`controller`]: the reconciliation core (pure planning plus the executor)
//! - [`resource`]: the [`resource::Replicable`] capability and its adapters
//! - [`store`]: the object store interface and its Kubernetes implementation
//! - [`config`], [`cli`]: process configuration
//! - [`runtime`], [`server`], [`observability`]: process wiring
//!
//! See the [README.md](../README.md) for deployment and usage.

pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod observability;
pub mod prelude;
pub mod resource;
pub mod runtime;
pub mod server;
pub mod store;
