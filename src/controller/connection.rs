//! Maintains exactly one southbound session per discovered switch.

use std::sync::Arc;

use async_trait::async_trait;

use super::watchers::TargetWatcher;
use super::{Controller, Reconciler, Reconciliation};
use crate::error::AppResult;
use crate::grpc::topo::P4RtServerInfo;
use crate::p4rt::ConnManager;
use crate::topo::TopoStore;

/// Build the connection controller.
pub fn new_connection_controller(topo: Arc<dyn TopoStore>, conns: ConnManager) -> Controller<String> {
    Controller::new("connection")
        .watch(TargetWatcher { topo: topo.clone() })
        .reconcile(ConnectionReconciler::new(topo, conns))
}

pub struct ConnectionReconciler {
    topo: Arc<dyn TopoStore>,
    conns: ConnManager,
}

impl ConnectionReconciler {
    pub fn new(topo: Arc<dyn TopoStore>, conns: ConnManager) -> Self {
        Self { topo, conns }
    }
}

#[async_trait]
impl Reconciler<String> for ConnectionReconciler {
    async fn reconcile(&self, target_id: String) -> AppResult<Reconciliation<String>> {
        let target = match self.topo.get(&target_id).await {
            Ok(target) => target,
            // The switch is gone; tear its session and relation down.
            Err(err) if err.is_not_found() => {
                self.conns.disconnect(&target_id).await?;
                return Ok(Reconciliation::done());
            }
            Err(err) => return Err(err),
        };

        if target.get_aspect::<P4RtServerInfo>().is_err() {
            return Ok(Reconciliation::done());
        }
        if self.conns.get_by_target(&target_id).is_ok() {
            return Ok(Reconciliation::done());
        }

        match self.conns.connect(&target).await {
            Ok(conn) => {
                tracing::info!(target_id = %target_id, conn_id = %conn.id(), "established connection to target");
                Ok(Reconciliation::done())
            }
            // A malformed endpoint only heals with a topology change.
            Err(err) if err.is_invalid() => {
                tracing::warn!(target_id = %target_id, error = %err, "target is not connectable");
                Ok(Reconciliation::done())
            }
            Err(err) => {
                tracing::warn!(target_id = %target_id, error = %err, "error connecting to target");
                Err(err)
            }
        }
    }
}
