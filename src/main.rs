//! The P4Runtime controller plane.

mod app;
mod config;
mod controller;
mod database;
mod error;
#[cfg(test)]
mod fixtures;
mod grpc;
mod kv;
mod models;
mod p4rt;
mod plugin;
mod store;
mod topo;
mod utils;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing/logging system.
    tracing_subscriber::registry()
        // Filter spans based on the RUST_LOG env var.
        .with(tracing_subscriber::EnvFilter::from_default_env())
        // Send a copy of all spans to stdout in compact form.
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
        )
        // Install this registry as the global tracing registry.
        .try_init()
        .context("error initializing logging/tracing system")?;

    let cfg = Arc::new(Config::new()?);
    tracing::info!(
        grpc_port = %cfg.grpc_port,
        topo_address = %cfg.topo_address,
        pod_name = %cfg.pod_name,
        pod_id = %cfg.pod_id,
        p4_plugins = ?cfg.p4_plugins,
        storage_data_path = %cfg.storage_data_path,
        "starting P4RT controller",
    );
    let (shutdown_tx, _) = broadcast::channel(1);
    if let Err(err) = App::new(cfg, shutdown_tx.clone()).await?.spawn().await {
        tracing::error!(error = ?err);
        let _res = shutdown_tx.send(());
    }

    // Ensure any pending output is flushed.
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    Ok(())
}
