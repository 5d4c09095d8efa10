//! # Resource Replicator
//!
//! Binary entry point. Configuration comes from the environment, overridden
//! by command-line flags; see [`resource_replicator::cli::Cli`].

use anyhow::{Context, Result};
use clap::Parser;
use resource_replicator::cli::Cli;
use resource_replicator::config::ReplicatorConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse()
        .apply(ReplicatorConfig::from_env())
        .context("Invalid configuration")?;

    resource_replicator::runtime::run(config).await
}
