use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, SignalStream};
use tokio_stream::StreamMap;

use crate::config::Config;
use crate::controller::{
    new_connection_controller, new_mastership_controller, new_node_controller, new_pipeline_config_controller, new_pipeliner_controller,
};
use crate::database::Database;
use crate::kv::SledMap;
use crate::p4rt::ConnManager;
use crate::plugin::P4PluginRegistry;
use crate::store::pipeline_config::PipelineConfigStore;
use crate::topo::{TopoClient, TopoStore};
use crate::utils;

/// The application object for when the controller is running as a server.
pub struct App {
    /// The application's runtime config.
    _config: Arc<Config>,
    /// The application's database system.
    _db: Database,
    /// The durable pipeline-config store.
    store: PipelineConfigStore,

    /// A channel used for triggering graceful shutdown.
    shutdown_tx: broadcast::Sender<()>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,

    /// The join handle of the node controller.
    node_handle: JoinHandle<Result<()>>,
    /// The join handle of the connection controller.
    connection_handle: JoinHandle<Result<()>>,
    /// The join handle of the mastership controller.
    mastership_handle: JoinHandle<Result<()>>,
    /// The join handle of the pipeliner controller.
    pipeliner_handle: JoinHandle<Result<()>>,
    /// The join handle of the pipeline-config controller.
    pipeline_config_handle: JoinHandle<Result<()>>,
}

impl App {
    /// Create a new instance.
    pub async fn new(config: Arc<Config>, shutdown_tx: broadcast::Sender<()>) -> Result<Self> {
        // Initialize this node's storage.
        let db = Database::new(config.clone()).await.context("error opening database")?;
        let map = Arc::new(SledMap::new(db.get_pipeline_config_tree().await?));
        let store = PipelineConfigStore::new(map).await.context("error opening pipeline config store")?;

        // Resolve P4 plugins from their configured artifacts.
        let plugins = Arc::new(P4PluginRegistry::new());
        for artifact in &config.p4_plugins {
            plugins.register_plugin(artifact).context("error registering P4 plugin")?;
        }

        // Connect the topology façade & the southbound connection manager.
        let topo: Arc<dyn TopoStore> = Arc::new(TopoClient::connect(&config).await?);
        let conns = ConnManager::new(config.clone(), topo.clone());

        let controller_id = utils::controller_id(&config.pod_id);
        let node_handle = new_node_controller(topo.clone(), controller_id.clone()).spawn(shutdown_tx.clone());
        let connection_handle = new_connection_controller(topo.clone(), conns.clone()).spawn(shutdown_tx.clone());
        let mastership_handle = new_mastership_controller(topo.clone(), conns.clone(), controller_id.clone()).spawn(shutdown_tx.clone());
        let pipeliner_handle = new_pipeliner_controller(topo.clone(), store.clone(), plugins).spawn(shutdown_tx.clone());
        let pipeline_config_handle = new_pipeline_config_controller(topo, conns, store.clone(), controller_id).spawn(shutdown_tx.clone());

        Ok(Self {
            _config: config,
            _db: db,
            store,
            shutdown_rx: BroadcastStream::new(shutdown_tx.subscribe()),
            shutdown_tx,
            node_handle,
            connection_handle,
            mastership_handle,
            pipeliner_handle,
            pipeline_config_handle,
        })
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        let mut signals = StreamMap::new();
        signals.insert("sigterm", SignalStream::new(signal(SignalKind::terminate()).context("error building signal stream")?));
        signals.insert("sigint", SignalStream::new(signal(SignalKind::interrupt()).context("error building signal stream")?));

        loop {
            tokio::select! {
                Some((_, sig)) = signals.next() => {
                    tracing::debug!(signal = ?sig, "signal received, beginning graceful shutdown");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = self.shutdown_rx.next() => break,
            }
        }

        // Begin shutdown routine.
        tracing::debug!("p4rt-controller is shutting down");
        if let Err(err) = self.node_handle.await.context("error joining node controller handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down node controller");
        }
        if let Err(err) = self.connection_handle.await.context("error joining connection controller handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down connection controller");
        }
        if let Err(err) = self.mastership_handle.await.context("error joining mastership controller handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down mastership controller");
        }
        if let Err(err) = self.pipeliner_handle.await.context("error joining pipeliner controller handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down pipeliner controller");
        }
        if let Err(err) = self
            .pipeline_config_handle
            .await
            .context("error joining pipeline-config controller handle")
            .and_then(|res| res)
        {
            tracing::error!(error = ?err, "error shutting down pipeline-config controller");
        }
        if let Err(err) = self.store.close().await {
            tracing::error!(error = ?err, "error closing pipeline config store");
        }

        tracing::debug!("p4rt-controller shutdown complete");
        Ok(())
    }
}
