//! torrd: starts the configured node instances and serves until ctrl-c.

use anyhow::Result;
use futures::future::join_all;

use torr_core::config::TorrConfig;
use torrd::{start_node, NodeSettings};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = TorrConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = TorrConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        TorrConfig::default()
    });
    tracing::info!(
        owner = %config.node.owner,
        instances = config.node.instances,
        hub = %format!("{}:{}", config.hub.host, config.hub.port),
        "torrd starting"
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Start instances ──────────────────────────────────────────────────────
    let mut tasks = Vec::new();
    for index in 1..=config.node.instances {
        let settings = NodeSettings::from_config(&config, index)?;
        match start_node(settings, &shutdown_tx).await {
            Ok(node) => {
                tracing::info!(node = %node.id, addr = %node.addr, "node started");
                tasks.push(node.task);
            }
            Err(e) => tracing::error!(index, error = ?e, "node did not start"),
        }
    }
    if tasks.is_empty() {
        anyhow::bail!("no node instance started");
    }

    // ── Wait for exit ────────────────────────────────────────────────────────
    for result in join_all(tasks).await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "listener failed"),
            Err(e) => tracing::error!(error = %e, "listener task panicked"),
        }
    }
    tracing::info!("shutting down");

    Ok(())
}
