//! Lifecycle of southbound sessions, keyed by switch.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tonic::transport::Channel;

use super::{new_conn_id, Conn, ConnId, P4rtSession};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::grpc::topo::{Object, P4RtServerInfo, TlsOptions};
use crate::grpc::KIND_CONTROLS;
use crate::topo::TopoStore;
use crate::utils;

/// Manages one live session per switch.
///
/// A connection's ID is minted fresh per session and doubles as the ID of the
/// control relation written into topology, which in turn is the value an
/// election win records as the mastership `node_id`.
#[derive(Clone)]
pub struct ConnManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: Arc<Config>,
    topo: Arc<dyn TopoStore>,
    conns: RwLock<HashMap<ConnId, Conn>>,
    targets: RwLock<HashMap<String, ConnId>>,
    watchers: RwLock<Vec<mpsc::Sender<Conn>>>,
}

impl ConnManager {
    pub fn new(config: Arc<Config>, topo: Arc<dyn TopoStore>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config,
                topo,
                conns: RwLock::new(HashMap::new()),
                targets: RwLock::new(HashMap::new()),
                watchers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Get a connection by its ID.
    pub fn get(&self, conn_id: &str) -> Option<Conn> {
        self.inner.conns.read().expect("conn index lock poisoned").get(conn_id).cloned()
    }

    /// Get the connection serving the given switch.
    pub fn get_by_target(&self, target_id: &str) -> AppResult<Conn> {
        let conn_id = self
            .inner
            .targets
            .read()
            .expect("target index lock poisoned")
            .get(target_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no connection for target '{}'", target_id)))?;
        self.get(&conn_id)
            .ok_or_else(|| AppError::NotFound(format!("no connection for target '{}'", target_id)))
    }

    /// Open a session to the given switch entity, recording the control
    /// relation in topology.
    ///
    /// Returns the existing connection when one is already live.
    pub async fn connect(&self, target: &Object) -> AppResult<Conn> {
        if let Ok(conn) = self.get_by_target(&target.id) {
            return Ok(conn);
        }

        let info: P4RtServerInfo = target.get_aspect()?;
        let endpoint = info
            .control_endpoint
            .as_ref()
            .ok_or_else(|| AppError::Invalid(format!("target '{}' has no control endpoint", target.id)))?;
        let address = format!("{}:{}", endpoint.address, endpoint.port);
        let plain = target
            .get_aspect::<TlsOptions>()
            .map(|tls| tls.plain || tls.insecure)
            .unwrap_or(false);
        let channel = self.dial(&address, plain).await?;

        let conn_id = new_conn_id();
        let session = P4rtSession::connect(channel, conn_id.clone(), target.id.clone()).await?;
        let conn: Conn = Arc::new(session);

        // The switch's advertised API version is worth a line in the log;
        // failure to answer is not fatal to the session.
        match conn.capabilities().await {
            Ok(capabilities) => {
                tracing::info!(target_id = %target.id, version = %capabilities.p4runtime_api_version, "connected to P4Runtime server")
            }
            Err(err) => tracing::warn!(target_id = %target.id, error = %err, "error probing P4Runtime capabilities"),
        }

        self.index(conn.clone());

        let controller_id = utils::controller_id(&self.inner.config.pod_id);
        let relation = Object::new_relation(conn_id.clone(), KIND_CONTROLS, controller_id, target.id.clone());
        if let Err(err) = self.inner.topo.create(relation).await {
            if !err.is_already_exists() {
                self.unindex(&target.id);
                return Err(err);
            }
        }

        self.notify(conn.clone()).await;
        tracing::info!(target_id = %target.id, conn_id = %conn_id, "new P4RT connection established");
        Ok(conn)
    }

    /// Tear down the session for the given switch, removing its control
    /// relation from topology. A switch without a session is a no-op.
    pub async fn disconnect(&self, target_id: &str) -> AppResult<()> {
        let conn = match self.unindex(target_id) {
            Some(conn) => conn,
            None => return Ok(()),
        };

        match self.inner.topo.get(conn.id()).await {
            Ok(relation) => {
                if let Err(err) = self.inner.topo.delete(conn.id(), relation.revision).await {
                    if !err.is_not_found() {
                        return Err(err);
                    }
                }
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        conn.close().await?;
        tracing::info!(target_id = %target_id, conn_id = %conn.id(), "P4RT connection closed");
        Ok(())
    }

    /// Register a sink for connection-open events.
    pub fn watch(&self, sink: mpsc::Sender<Conn>) {
        self.inner.watchers.write().expect("conn watcher lock poisoned").push(sink);
    }

    async fn dial(&self, address: &str, plain: bool) -> AppResult<Channel> {
        if plain {
            let endpoint =
                Channel::from_shared(format!("http://{}", address)).map_err(|err| AppError::Invalid(format!("invalid endpoint: {}", err)))?;
            return endpoint.connect().await.map_err(|err| AppError::Unavailable(err.to_string()));
        }
        utils::grpc_channel(address, &self.inner.config)
            .await
            .map_err(|err| AppError::Unavailable(err.to_string()))
    }

    fn index(&self, conn: Conn) {
        self.inner
            .targets
            .write()
            .expect("target index lock poisoned")
            .insert(conn.target_id().to_string(), conn.id().to_string());
        self.inner
            .conns
            .write()
            .expect("conn index lock poisoned")
            .insert(conn.id().to_string(), conn);
    }

    fn unindex(&self, target_id: &str) -> Option<Conn> {
        let conn_id = self.inner.targets.write().expect("target index lock poisoned").remove(target_id)?;
        self.inner.conns.write().expect("conn index lock poisoned").remove(&conn_id)
    }

    async fn notify(&self, conn: Conn) {
        let mut closed = false;
        {
            let watchers = self.inner.watchers.read().expect("conn watcher lock poisoned");
            for watcher in watchers.iter() {
                match watcher.try_send(conn.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(conn_id = %conn.id(), "connection watcher too slow, dropping event")
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed = true,
                }
            }
        }
        if closed {
            self.inner
                .watchers
                .write()
                .expect("conn watcher lock poisoned")
                .retain(|watcher| !watcher.is_closed());
        }
    }

    /// Register an externally built session, for tests exercising the
    /// reconcilers without a live switch.
    #[cfg(test)]
    pub(crate) async fn insert(&self, conn: Conn) {
        self.index(conn.clone());
        self.notify(conn).await;
    }
}
