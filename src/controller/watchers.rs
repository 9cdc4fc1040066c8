//! Watchers shared by the switch-scoped controllers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use super::Watcher;
use crate::error::AppResult;
use crate::grpc::topo::P4RtServerInfo;
use crate::p4rt::{Conn, ConnManager};
use crate::topo::TopoStore;

/// Capacity of a watcher's internal event buffer.
const EVENT_BUFFER: usize = 100;

/// Emits the switch ID of every topology event touching a P4RT-capable
/// entity.
pub struct TargetWatcher {
    pub topo: Arc<dyn TopoStore>,
}

#[async_trait]
impl Watcher<String> for TargetWatcher {
    async fn start(&mut self, ch: mpsc::Sender<String>, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let mut events = self.topo.watch().await?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => {
                        let event = match event {
                            Some(event) => event,
                            None => return,
                        };
                        let object = match event.object {
                            Some(object) => object,
                            None => continue,
                        };
                        // Only entities carrying P4RT server details are
                        // reconcilable switches.
                        if object.is_entity() && object.get_aspect::<P4RtServerInfo>().is_ok() {
                            if ch.send(object.id).await.is_err() {
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

/// Emits the target ID of every newly opened southbound connection.
pub struct ConnWatcher {
    pub conns: ConnManager,
}

#[async_trait]
impl Watcher<String> for ConnWatcher {
    async fn start(&mut self, ch: mpsc::Sender<String>, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let (conn_tx, mut conn_rx) = mpsc::channel::<Conn>(EVENT_BUFFER);
        self.conns.watch(conn_tx);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    conn = conn_rx.recv() => {
                        let conn = match conn {
                            Some(conn) => conn,
                            None => return,
                        };
                        tracing::debug!(conn_id = %conn.id(), "received P4RT connection event");
                        if ch.send(conn.target_id().to_string()).await.is_err() {
                            return;
                        }
                    }
                    _ = shutdown.recv() => return,
                }
            }
        });
        Ok(())
    }
}
