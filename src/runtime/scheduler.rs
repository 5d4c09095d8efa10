//! # Scheduler
//!
//! Fixed-interval loop driving reconciliation passes.
//!
//! Each tick lists namespaces once, runs the Secret and ConfigMap passes
//! concurrently against that shared list, waits for both, then sleeps for
//! `loop_duration`. Ticks never overlap. A tick whose namespace listing
//! fails is skipped; a pass whose kind cannot be listed is retried on the
//! next tick.

use crate::config::ReplicatorConfig;
use crate::controller::{run_pass, ExecutorSettings, PassReport, ReplicatorError};
use crate::observability;
use crate::store::{NamespaceLister, ResourceStore, StoreError};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::future::Future;
use tracing::{error, info, info_span, Instrument};

/// Results of one scheduler tick
#[derive(Debug)]
pub struct TickReport {
    pub namespaces: usize,
    /// `None` when the kind is disabled
    pub secrets: Option<Result<PassReport, ReplicatorError>>,
    pub configmaps: Option<Result<PassReport, ReplicatorError>>,
}

impl TickReport {
    /// Every enabled pass ran and completed without failures
    #[must_use]
    pub fn is_clean(&self) -> bool {
        [&self.secrets, &self.configmaps]
            .into_iter()
            .flatten()
            .all(|pass| pass.as_ref().is_ok_and(PassReport::is_clean))
    }
}

/// Run one tick: list namespaces, then both passes concurrently
///
/// Returns the namespace listing error if the tick had to be skipped.
pub async fn run_tick<N, SS, CS>(
    namespaces: &N,
    secrets: &SS,
    configmaps: &CS,
    config: &ReplicatorConfig,
) -> Result<TickReport, StoreError>
where
    N: NamespaceLister + ?Sized,
    SS: ResourceStore<Secret> + ?Sized,
    CS: ResourceStore<ConfigMap> + ?Sized,
{
    let settings = config.executor_settings();

    let namespace_list = match list_namespaces(namespaces, settings).await {
        Ok(list) => list,
        Err(e) => {
            error!("Failed to list namespaces, skipping tick: {}", e);
            observability::increment_namespace_list_failures();
            return Err(e);
        }
    };

    let secret_pass = async {
        if config.replicate_secrets {
            Some(record(run_pass::<Secret, SS>(secrets, &namespace_list, settings).await))
        } else {
            None
        }
    };
    let configmap_pass = async {
        if config.replicate_configmaps {
            Some(record(
                run_pass::<ConfigMap, CS>(configmaps, &namespace_list, settings).await,
            ))
        } else {
            None
        }
    };
    let (secrets, configmaps) = tokio::join!(secret_pass, configmap_pass);

    Ok(TickReport {
        namespaces: namespace_list.len(),
        secrets,
        configmaps,
    })
}

async fn list_namespaces<N>(lister: &N, settings: ExecutorSettings) -> Result<Vec<String>, StoreError>
where
    N: NamespaceLister + ?Sized,
{
    match tokio::time::timeout(settings.operation_timeout, lister.list_namespaces()).await {
        Ok(result) => result,
        Err(_elapsed) => Err(StoreError::Timeout {
            operation: "list namespaces",
            timeout: settings.operation_timeout,
        }),
    }
}

fn record(result: Result<PassReport, ReplicatorError>) -> Result<PassReport, ReplicatorError> {
    match &result {
        Ok(report) => {
            observability::record_pass(report);
            if !report.failures.is_empty() {
                error!(
                    resource = %report.kind,
                    failures = %serde_json::to_string(&report.failures).unwrap_or_default(),
                    "Pass had failed operations"
                );
            }
        }
        Err(e) => {
            error!("Pass aborted: {}", e);
            if let ReplicatorError::ListFailed { kind, .. } = e {
                observability::increment_pass_failures(*kind);
            }
        }
    }
    result
}

/// Run ticks until `shutdown` resolves, or once when `run_once` is set
///
/// A tick in progress is always completed before the loop exits. In
/// `run_once` mode an unclean tick is returned as an error.
pub async fn run_scheduler<N, SS, CS, F>(
    namespaces: &N,
    secrets: &SS,
    configmaps: &CS,
    config: &ReplicatorConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    N: NamespaceLister + ?Sized,
    SS: ResourceStore<Secret> + ?Sized,
    CS: ResourceStore<ConfigMap> + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tick: u64 = 0;

    loop {
        tick += 1;
        let result = run_tick(namespaces, secrets, configmaps, config)
            .instrument(info_span!("replicator.tick", tick))
            .await;

        if config.run_once {
            return match result {
                Ok(report) if report.is_clean() => Ok(()),
                Ok(_) => Err(anyhow::anyhow!("Replication pass completed with errors")),
                Err(e) => Err(anyhow::Error::new(e).context("Failed to list namespaces")),
            };
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested, exiting scheduler loop");
                return Ok(());
            }
            () = tokio::time::sleep(config.loop_duration) => {}
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
}
