//! # Runtime
//!
//! Process wiring around the reconciliation core.
//!
//! - `initialization`: rustls, logging, metrics server and Kubernetes client
//! - `scheduler`: fixed-interval tick loop and shutdown handling

pub mod initialization;
pub mod scheduler;

pub use initialization::{initialize, InitializationResult};
pub use scheduler::{run_scheduler, run_tick, shutdown_signal, TickReport};

use crate::config::ReplicatorConfig;
use crate::store::KubeStore;
use anyhow::Result;
use tracing::info;

/// Initialize the process and run the scheduler until shutdown
pub async fn run(config: ReplicatorConfig) -> Result<()> {
    let init = initialize(&config).await?;
    let store = KubeStore::new(init.client.clone());

    let result = run_scheduler(&store, &store, &store, &config, shutdown_signal()).await;

    init.server_state.set_ready(false);
    info!("Resource Replicator stopped");
    result
}
