//! # Initialization
//!
//! Process startup: rustls provider, logging, metrics, the probe server and
//! the Kubernetes client.

use crate::config::ReplicatorConfig;
use crate::observability;
use crate::server::{bind, serve, ServerState};
use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Components the scheduler needs once startup is complete
pub struct InitializationResult {
    pub client: Client,
    /// Readiness flag shared with the probe server
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the replicator runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration and HTTP server startup
/// - Kubernetes client creation
pub async fn initialize(config: &ReplicatorConfig) -> Result<InitializationResult> {
    // Must run before any TLS connection is made
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    observability::logging::init_tracing(config)?;
    if !provider_installed {
        warn!("A rustls crypto provider was already installed, keeping it");
    }

    info!("Starting Resource Replicator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        loop_duration = ?config.loop_duration,
        debug = config.debug,
        secrets = config.replicate_secrets,
        configmaps = config.replicate_configmaps,
        max_concurrent_operations = config.max_concurrent_operations,
        operation_timeout = ?config.operation_timeout,
        "Configuration loaded"
    );

    let server_state = Arc::new(ServerState::new());
    if config.enable_metrics {
        observability::metrics::register_metrics()?;

        // Bind before spawning so a taken port fails startup
        let listener = bind(config.metrics_port).await?;
        let state = Arc::clone(&server_state);
        tokio::spawn(async move {
            if let Err(e) = serve(listener, state).await {
                error!("HTTP server error: {}", e);
            }
        });
    } else {
        info!("Metrics disabled, probe server not started");
    }

    let client = build_client(config).await?;
    server_state.set_ready(true);
    info!("Replicator initialized, starting scheduler...");

    Ok(InitializationResult {
        client,
        server_state,
    })
}

/// Build the Kubernetes client from an explicit kubeconfig/context or by inference
async fn build_client(config: &ReplicatorConfig) -> Result<Client> {
    let options = KubeConfigOptions {
        context: config.context.clone(),
        ..KubeConfigOptions::default()
    };

    let kube_config = match (&config.kubeconfig, &config.context) {
        (Some(path), _) => {
            info!("Using kubeconfig {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .context("Failed to load kubeconfig")?
        }
        (None, Some(context)) => {
            info!("Using kubeconfig context {}", context);
            kube::Config::from_kubeconfig(&options)
                .await
                .context("Failed to load kubeconfig context")?
        }
        (None, None) => kube::Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    Client::try_from(kube_config).context("Failed to create Kubernetes client")
}
