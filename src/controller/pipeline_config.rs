//! Executes pending pipeline-config records against their switches.
//!
//! Runs only on the replica holding mastership; the record's status is the
//! durable account of the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use super::watchers::ConnWatcher as TargetConnWatcher;
use super::{Controller, Reconciler, Reconciliation, Watcher};
use crate::error::{AppError, AppResult};
use crate::grpc::p4rt::{
    get_forwarding_pipeline_config_request, set_forwarding_pipeline_config_request, ForwardingPipelineConfig, GetForwardingPipelineConfigRequest,
    SetForwardingPipelineConfigRequest, Uint128,
};
use crate::grpc::p4info::P4Info;
use crate::grpc::topo::{P4RtMastershipState, P4RtServerInfo};
use crate::models::p4rt::{new_pipeline_config_id, ConfigurationAction, PipelineConfig, PipelineConfigId, PipelineConfigState};
use crate::p4rt::ConnManager;
use crate::store::pipeline_config::{PipelineConfigStore, WatchOptions};
use crate::topo::TopoStore;
use crate::utils;

/// Build the pipeline-config controller.
pub fn new_pipeline_config_controller(
    topo: Arc<dyn TopoStore>, conns: ConnManager, pipeline_configs: PipelineConfigStore, controller_id: String,
) -> Controller<PipelineConfigId> {
    Controller::new("pipelineconfig")
        .watch(TopoWatcher { topo: topo.clone() })
        .watch(StoreWatcher {
            pipeline_configs: pipeline_configs.clone(),
        })
        .watch(ConnWatcher {
            topo: topo.clone(),
            conns: conns.clone(),
        })
        .reconcile(PipelineConfigReconciler::new(topo, conns, pipeline_configs, controller_id))
}

/// Maps a switch entity to the record ID of its first declared pipeline.
fn pipeline_config_id_of(object: &crate::grpc::topo::Object) -> Option<PipelineConfigId> {
    let server_info: P4RtServerInfo = object.get_aspect().ok()?;
    let pipeline = server_info.pipelines.first()?;
    Some(new_pipeline_config_id(&object.id, &pipeline.name, &pipeline.version, &pipeline.architecture))
}

/// Emits the record ID derived from every P4RT-capable entity event.
struct TopoWatcher {
    topo: Arc<dyn TopoStore>,
}

#[async_trait]
impl Watcher<PipelineConfigId> for TopoWatcher {
    async fn start(&mut self, ch: mpsc::Sender<PipelineConfigId>, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
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
                        if !object.is_entity() {
                            continue;
                        }
                        if let Some(id) = pipeline_config_id_of(&object) {
                            if ch.send(id).await.is_err() {
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

/// Emits the ID of every record the store reports changed, replaying current
/// records at startup.
struct StoreWatcher {
    pipeline_configs: PipelineConfigStore,
}

#[async_trait]
impl Watcher<PipelineConfigId> for StoreWatcher {
    async fn start(&mut self, ch: mpsc::Sender<PipelineConfigId>, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let mut events = self
            .pipeline_configs
            .watch(WatchOptions {
                pipeline_config_id: None,
                replay: true,
            })
            .await?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => {
                        let event = match event {
                            Some(event) => event,
                            None => return,
                        };
                        if ch.send(event.pipeline_config.id).await.is_err() {
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

/// Emits the record ID of a connection's target when the session opens.
struct ConnWatcher {
    topo: Arc<dyn TopoStore>,
    conns: ConnManager,
}

#[async_trait]
impl Watcher<PipelineConfigId> for ConnWatcher {
    async fn start(&mut self, ch: mpsc::Sender<PipelineConfigId>, shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let (target_tx, mut target_rx) = mpsc::channel::<String>(100);
        let mut inner = TargetConnWatcher { conns: self.conns.clone() };
        inner.start(target_tx, shutdown).await?;
        let topo = self.topo.clone();
        tokio::spawn(async move {
            while let Some(target_id) = target_rx.recv().await {
                let target = match topo.get(&target_id).await {
                    Ok(target) => target,
                    Err(_) => continue,
                };
                if let Some(id) = pipeline_config_id_of(&target) {
                    if ch.send(id).await.is_err() {
                        return;
                    }
                }
            }
        });
        Ok(())
    }
}

pub struct PipelineConfigReconciler {
    topo: Arc<dyn TopoStore>,
    conns: ConnManager,
    pipeline_configs: PipelineConfigStore,
    controller_id: String,
}

impl PipelineConfigReconciler {
    pub fn new(topo: Arc<dyn TopoStore>, conns: ConnManager, pipeline_configs: PipelineConfigStore, controller_id: String) -> Self {
        Self {
            topo,
            conns,
            pipeline_configs,
            controller_id,
        }
    }

    async fn reconcile_verify_and_commit(&self, mut pipeline_config: PipelineConfig) -> AppResult<Reconciliation<PipelineConfigId>> {
        let target_id = pipeline_config.target_id.clone();
        let target = match self.topo.get(&target_id).await {
            Ok(target) => target,
            Err(err) if err.is_not_found() => return Ok(Reconciliation::done()),
            Err(err) => {
                tracing::error!(target_id = %target_id, error = %err, "failed reconciling device pipeline config for target");
                return Err(err);
            }
        };
        let server_info: P4RtServerInfo = target.get_aspect().map_err(|err| {
            tracing::error!(target_id = %target_id, error = %err, "failed reconciling device pipeline config for target");
            err
        })?;
        let mastership = target.get_aspect::<P4RtMastershipState>().unwrap_or_default();

        // Nobody has won an election yet; a mastership event will requeue us.
        if mastership.node_id.is_empty() {
            tracing::info!(target_id = %target_id, "no master for target");
            return Ok(Reconciliation::done());
        }

        // Only the replica behind the master relation may push the config.
        let relation_object = match self.topo.get(&mastership.node_id).await {
            Ok(relation) => relation,
            Err(err) if err.is_not_found() => {
                tracing::warn!(target_id = %target_id, "master relation not found for target");
                return Ok(Reconciliation::done());
            }
            Err(err) => {
                tracing::error!(node_id = %mastership.node_id, error = %err, "failed fetching master relation from topo");
                return Err(err);
            }
        };
        let is_master = relation_object
            .relation()
            .map(|relation| relation.src_entity_id == self.controller_id)
            .unwrap_or(false);
        if !is_master {
            tracing::debug!(target_id = %target_id, "not the master for target");
            return Ok(Reconciliation::done());
        }

        let conn = match self.conns.get(&mastership.node_id) {
            Some(conn) => conn,
            None => {
                tracing::warn!(target_id = %target_id, "P4RT connection not found for target");
                return Ok(Reconciliation::done());
            }
        };

        let spec = pipeline_config.spec.clone().unwrap_or_default();
        let p4info: P4Info = utils::decode_model(&spec.p4_info).map_err(|err| AppError::Invalid(format!("stored P4Info decoding failed: {}", err)))?;
        let config = ForwardingPipelineConfig {
            p4info: Some(p4info),
            p4_device_config: spec.p4_device_config,
            cookie: None,
        };
        let request = SetForwardingPipelineConfigRequest {
            device_id: server_info.device_id,
            election_id: Some(Uint128 {
                low: mastership.term,
                high: 0,
            }),
            action: set_forwarding_pipeline_config_request::Action::VerifyAndCommit as i32,
            config: Some(config),
            role: String::new(),
        };

        if let Err(err) = conn.set_forwarding_pipeline_config(request).await {
            tracing::error!(target_id = %target_id, error = %err, "failed reconciling device pipeline config for target");
            pipeline_config.set_state(PipelineConfigState::Failed);
            return match self.pipeline_configs.update(&mut pipeline_config).await {
                Ok(()) => Ok(Reconciliation::done()),
                // The record moved underneath us; whoever moved it owns it now.
                Err(err) if err.is_not_found() || err.is_conflict() => Ok(Reconciliation::done()),
                Err(err) => {
                    tracing::error!(target_id = %target_id, error = %err, "failed recording pipeline config failure");
                    Err(err)
                }
            };
        }

        pipeline_config.set_state(PipelineConfigState::Complete);
        match self.pipeline_configs.update(&mut pipeline_config).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() || err.is_conflict() => return Ok(Reconciliation::done()),
            Err(err) => {
                tracing::error!(target_id = %target_id, error = %err, "failed recording pipeline config completion");
                return Err(err);
            }
        }

        // Read the installed config back for the log; the record state is
        // already settled.
        match conn
            .get_forwarding_pipeline_config(GetForwardingPipelineConfigRequest {
                device_id: server_info.device_id,
                response_type: get_forwarding_pipeline_config_request::ResponseType::All as i32,
            })
            .await
        {
            Ok(_response) => tracing::info!(target_id = %target_id, "device pipeline config is set successfully"),
            Err(err) => tracing::warn!(target_id = %target_id, error = %err, "error reading back device pipeline config"),
        }

        Ok(Reconciliation::done())
    }
}

#[async_trait]
impl Reconciler<PipelineConfigId> for PipelineConfigReconciler {
    async fn reconcile(&self, pipeline_config_id: PipelineConfigId) -> AppResult<Reconciliation<PipelineConfigId>> {
        let pipeline_config = match self.pipeline_configs.get(&pipeline_config_id).await {
            Ok(pipeline_config) => pipeline_config,
            Err(err) if err.is_not_found() => {
                tracing::debug!(pipeline_config_id = %pipeline_config_id, "pipeline configuration not found");
                return Ok(Reconciliation::done());
            }
            Err(err) => {
                tracing::warn!(pipeline_config_id = %pipeline_config_id, error = %err, "failed to reconcile pipeline configuration");
                return Err(err);
            }
        };

        // Anything past pending has already been settled.
        if pipeline_config.state() != PipelineConfigState::Pending {
            return Ok(Reconciliation::done());
        }

        let spec = pipeline_config.spec.clone().unwrap_or_default();
        if spec.p4_info.is_empty() || spec.p4_device_config.is_empty() {
            tracing::warn!(pipeline_config_id = %pipeline_config_id, "pipeline config spec is incomplete, skipping");
            return Ok(Reconciliation::done());
        }

        tracing::info!(target_id = %pipeline_config.target_id, "reconciling device pipeline config for target");
        match ConfigurationAction::from_i32(pipeline_config.action) {
            Some(ConfigurationAction::VerifyAndCommit) => self.reconcile_verify_and_commit(pipeline_config).await,
            None => Ok(Reconciliation::done()),
        }
    }
}
