//! Read-mostly façade over the external topology service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tonic::transport::Channel;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::grpc::topo::topo_client::TopoClient as GrpcTopoClient;
use crate::grpc::topo::{
    filter, CreateRequest, DeleteRequest, EqualFilter, Event, Filter, Filters, GetRequest, ListRequest, Object, UpdateRequest, WatchRequest,
};
use crate::utils;

/// Capacity of a topology watch channel.
const WATCH_BUFFER: usize = 100;
/// Delay before re-establishing a broken topology watch stream.
const WATCH_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// The topology store contract consumed by the reconcilers.
///
/// `update` is optimistically concurrent on the object's own revision;
/// callers treat `Conflict` as a signal to re-reconcile. `create` and
/// `delete` exist for the objects this system owns: the controller entity
/// and the control relations.
#[async_trait]
pub trait TopoStore: Send + Sync + 'static {
    /// Get an object by ID.
    async fn get(&self, id: &str) -> AppResult<Object>;
    /// List all objects, optionally restricted to a kind.
    async fn list(&self, kind: Option<&str>) -> AppResult<Vec<Object>>;
    /// Create a new object.
    async fn create(&self, object: Object) -> AppResult<Object>;
    /// Update an existing object against its revision.
    async fn update(&self, object: Object) -> AppResult<Object>;
    /// Delete an object at the given revision.
    async fn delete(&self, id: &str, revision: u64) -> AppResult<()>;
    /// Stream topology change events.
    async fn watch(&self) -> AppResult<mpsc::Receiver<Event>>;
}

/// The gRPC-backed topology store.
#[derive(Clone)]
pub struct TopoClient {
    client: GrpcTopoClient<Channel>,
}

impl TopoClient {
    /// Connect to the topology service named in config.
    pub async fn connect(config: &Config) -> Result<Self> {
        let channel = utils::grpc_channel(&config.topo_address, config)
            .await
            .context("error connecting to topology service")?;
        Ok(Self {
            client: GrpcTopoClient::new(channel),
        })
    }
}

#[async_trait]
impl TopoStore for TopoClient {
    async fn get(&self, id: &str) -> AppResult<Object> {
        let response = self
            .client
            .clone()
            .get(GetRequest { id: id.to_string() })
            .await
            .map_err(AppError::from_status)?;
        response
            .into_inner()
            .object
            .ok_or_else(|| AppError::Internal("topology returned an empty object".into()))
    }

    async fn list(&self, kind: Option<&str>) -> AppResult<Vec<Object>> {
        let filters = kind.map(|kind| Filters {
            kind_filter: Some(Filter {
                filter: Some(filter::Filter::Equal(EqualFilter { value: kind.to_string() })),
            }),
        });
        let response = self.client.clone().list(ListRequest { filters }).await.map_err(AppError::from_status)?;
        Ok(response.into_inner().objects)
    }

    async fn create(&self, object: Object) -> AppResult<Object> {
        let response = self
            .client
            .clone()
            .create(CreateRequest { object: Some(object) })
            .await
            .map_err(AppError::from_status)?;
        response
            .into_inner()
            .object
            .ok_or_else(|| AppError::Internal("topology returned an empty object".into()))
    }

    async fn update(&self, object: Object) -> AppResult<Object> {
        let response = self
            .client
            .clone()
            .update(UpdateRequest { object: Some(object) })
            .await
            .map_err(AppError::from_status)?;
        response
            .into_inner()
            .object
            .ok_or_else(|| AppError::Internal("topology returned an empty object".into()))
    }

    async fn delete(&self, id: &str, revision: u64) -> AppResult<()> {
        self.client
            .clone()
            .delete(DeleteRequest {
                id: id.to_string(),
                revision,
            })
            .await
            .map_err(AppError::from_status)?;
        Ok(())
    }

    async fn watch(&self) -> AppResult<mpsc::Receiver<Event>> {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let client = self.client.clone();
        tokio::spawn(async move {
            loop {
                if tx.is_closed() {
                    return;
                }
                let mut stream = match client.clone().watch(WatchRequest { noreplay: false }).await {
                    Ok(response) => response.into_inner(),
                    Err(err) => {
                        tracing::error!(error = ?err, "error establishing topology watch stream");
                        tokio::time::sleep(WATCH_RETRY_INTERVAL).await;
                        continue;
                    }
                };
                loop {
                    match stream.message().await {
                        Ok(Some(response)) => {
                            if let Some(event) = response.event {
                                if tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            tracing::error!(error = ?err, "error on topology watch stream");
                            break;
                        }
                    }
                }
                tokio::time::sleep(WATCH_RETRY_INTERVAL).await;
            }
        });
        Ok(rx)
    }
}
