//! Translates a switch's declared desired pipeline into a store record.
//!
//! This is the only creator of pipeline-config records; status transitions
//! belong to the pipeline-config controller.

use std::sync::Arc;

use async_trait::async_trait;

use super::watchers::TargetWatcher;
use super::{Controller, Reconciler, Reconciliation};
use crate::error::AppResult;
use crate::grpc::topo::P4RtServerInfo;
use crate::models::p4rt::{new_pipeline_config_id, ConfigurationAction, PipelineConfig, PipelineConfigSpec, PipelineConfigState};
use crate::plugin::{new_plugin_id, P4PluginRegistry};
use crate::store::pipeline_config::PipelineConfigStore;
use crate::topo::TopoStore;
use crate::utils;

/// Build the pipeliner controller.
pub fn new_pipeliner_controller(topo: Arc<dyn TopoStore>, pipeline_configs: PipelineConfigStore, plugins: Arc<P4PluginRegistry>) -> Controller<String> {
    Controller::new("pipeliner")
        .watch(TargetWatcher { topo: topo.clone() })
        .reconcile(PipelinerReconciler::new(topo, pipeline_configs, plugins))
}

pub struct PipelinerReconciler {
    topo: Arc<dyn TopoStore>,
    pipeline_configs: PipelineConfigStore,
    plugins: Arc<P4PluginRegistry>,
}

impl PipelinerReconciler {
    pub fn new(topo: Arc<dyn TopoStore>, pipeline_configs: PipelineConfigStore, plugins: Arc<P4PluginRegistry>) -> Self {
        Self {
            topo,
            pipeline_configs,
            plugins,
        }
    }
}

#[async_trait]
impl Reconciler<String> for PipelinerReconciler {
    async fn reconcile(&self, target_id: String) -> AppResult<Reconciliation<String>> {
        let target = match self.topo.get(&target_id).await {
            Ok(target) => target,
            Err(err) if err.is_not_found() => return Ok(Reconciliation::done()),
            Err(err) => return Err(err),
        };
        let server_info: P4RtServerInfo = target.get_aspect().map_err(|err| {
            tracing::error!(target_id = %target_id, error = %err, "failed creating device pipeline config for target");
            err
        })?;
        if server_info.pipelines.is_empty() {
            tracing::warn!(target_id = %target_id, "no pipelines declared for target, nothing to create");
            return Ok(Reconciliation::done());
        }

        let pipeline = &server_info.pipelines[0];
        let pipeline_config_id = new_pipeline_config_id(&target_id, &pipeline.name, &pipeline.version, &pipeline.architecture);
        let plugin_id = new_plugin_id(&pipeline.name, &pipeline.version, &pipeline.architecture);
        let plugin = self.plugins.get_plugin(&plugin_id).map_err(|err| {
            tracing::error!(pipeline_config_id = %pipeline_config_id, target_id = %target_id, error = %err, "failed creating device pipeline config for target");
            err
        })?;

        // An absent device config is permitted; the record carries it empty.
        let device_config = match plugin.get_p4_device_config() {
            Ok(device_config) => device_config,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err),
        };
        let p4info = plugin.get_p4_info();
        let p4info_bytes = utils::encode_model(&p4info).map_err(|err| {
            tracing::error!(pipeline_config_id = %pipeline_config_id, target_id = %target_id, error = %err, "failed creating device pipeline config for target");
            crate::error::AppError::Invalid(err.to_string())
        })?;

        let mut pipeline_config = PipelineConfig {
            id: pipeline_config_id.clone(),
            target_id: target_id.clone(),
            action: ConfigurationAction::VerifyAndCommit as i32,
            spec: Some(PipelineConfigSpec {
                p4_info: p4info_bytes,
                p4_device_config: device_config,
            }),
            ..Default::default()
        };
        pipeline_config.set_state(PipelineConfigState::Pending);

        match self.pipeline_configs.create(&mut pipeline_config).await {
            Ok(()) => {
                tracing::info!(pipeline_config_id = %pipeline_config_id, target_id = %target_id, "device pipeline config created in pipeline config store");
                Ok(Reconciliation::done())
            }
            // Another replica (or an earlier tick) already created it.
            Err(err) if err.is_already_exists() => Ok(Reconciliation::done()),
            Err(err) => {
                tracing::error!(target_id = %target_id, error = %err, "failed creating pipeline config for target");
                Err(err)
            }
        }
    }
}
