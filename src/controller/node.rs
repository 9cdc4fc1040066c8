//! Registers this controller replica as a topology entity.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use super::{Controller, Reconciler, Reconciliation, Watcher};
use crate::error::AppResult;
use crate::grpc::topo::{ControllerInfo, ControllerRole, Object};
use crate::grpc::KIND_CONTROLLER;
use crate::topo::TopoStore;

/// The role name this controller contests mastership under.
pub const ROLE_NAME: &str = "p4rt";

/// Build the node controller.
pub fn new_node_controller(topo: Arc<dyn TopoStore>, controller_id: String) -> Controller<String> {
    Controller::new("node")
        .watch(NodeWatcher {
            topo: topo.clone(),
            controller_id: controller_id.clone(),
        })
        .reconcile(NodeReconciler::new(topo, controller_id))
}

/// Emits the local controller ID once at startup, then again whenever a
/// topology event touches the controller entity.
pub struct NodeWatcher {
    pub topo: Arc<dyn TopoStore>,
    pub controller_id: String,
}

#[async_trait]
impl Watcher<String> for NodeWatcher {
    async fn start(&mut self, ch: mpsc::Sender<String>, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let mut events = self.topo.watch().await?;
        let controller_id = self.controller_id.clone();
        tokio::spawn(async move {
            if ch.send(controller_id.clone()).await.is_err() {
                return;
            }
            loop {
                tokio::select! {
                    event = events.recv() => {
                        let event = match event {
                            Some(event) => event,
                            None => return,
                        };
                        let matches = event.object.as_ref().map(|object| object.id == controller_id).unwrap_or(false);
                        if matches {
                            if ch.send(controller_id.clone()).await.is_err() {
                                return;
                            }
                        }
                    }
                    _ = shutdown.recv() => return,
                }
            }
        });
        Ok(())
    }
}

pub struct NodeReconciler {
    topo: Arc<dyn TopoStore>,
    controller_id: String,
}

impl NodeReconciler {
    pub fn new(topo: Arc<dyn TopoStore>, controller_id: String) -> Self {
        Self { topo, controller_id }
    }
}

#[async_trait]
impl Reconciler<String> for NodeReconciler {
    async fn reconcile(&self, controller_id: String) -> AppResult<Reconciliation<String>> {
        match self.topo.get(&controller_id).await {
            Ok(_) => return Ok(Reconciliation::done()),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let mut entity = Object::new_entity(controller_id.clone(), KIND_CONTROLLER);
        entity.set_aspect(&ControllerInfo {
            uri: self.controller_id.clone(),
            role: Some(ControllerRole { name: ROLE_NAME.into() }),
        })?;
        match self.topo.create(entity).await {
            Ok(_) => {
                tracing::info!(controller_id = %controller_id, "controller entity registered in topology");
                Ok(Reconciliation::done())
            }
            Err(err) if err.is_already_exists() => Ok(Reconciliation::done()),
            Err(err) => {
                tracing::warn!(controller_id = %controller_id, error = %err, "error registering controller entity");
                Err(err)
            }
        }
    }
}
