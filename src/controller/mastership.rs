//! Mastership election per switch.
//!
//! This is the only writer of the mastership aspect: it contests elections
//! over the southbound stream and records the outcome in topology.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::watchers::{ConnWatcher, TargetWatcher};
use super::{Controller, Reconciler, Reconciliation};
use crate::error::AppResult;
use crate::grpc::topo::{ControllerInfo, Object, P4RtMastershipState, P4RtServerInfo};
use crate::grpc::KIND_CONTROLS;
use crate::p4rt::ConnManager;
use crate::topo::TopoStore;

/// Build the mastership controller.
pub fn new_mastership_controller(topo: Arc<dyn TopoStore>, conns: ConnManager, controller_id: String) -> Controller<String> {
    Controller::new("mastership")
        .watch(TargetWatcher { topo: topo.clone() })
        .watch(ConnWatcher { conns: conns.clone() })
        .reconcile(MastershipReconciler::new(topo, conns, controller_id))
}

pub struct MastershipReconciler {
    topo: Arc<dyn TopoStore>,
    conns: ConnManager,
    controller_id: String,
}

impl MastershipReconciler {
    pub fn new(topo: Arc<dyn TopoStore>, conns: ConnManager, controller_id: String) -> Self {
        Self {
            topo,
            conns,
            controller_id,
        }
    }
}

#[async_trait]
impl Reconciler<String> for MastershipReconciler {
    async fn reconcile(&self, target_id: String) -> AppResult<Reconciliation<String>> {
        tracing::info!(target_id = %target_id, "reconciling mastership election for the P4RT target");
        let mut target = match self.topo.get(&target_id).await {
            Ok(target) => target,
            Err(err) if err.is_not_found() => return Ok(Reconciliation::done()),
            Err(err) => {
                tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
                return Err(err);
            }
        };
        let controller = match self.topo.get(&self.controller_id).await {
            Ok(controller) => controller,
            Err(err) if err.is_not_found() => return Ok(Reconciliation::done()),
            Err(err) => {
                tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
                return Err(err);
            }
        };

        let server_info: P4RtServerInfo = target.get_aspect().map_err(|err| {
            tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
            err
        })?;
        let controller_info: ControllerInfo = controller.get_aspect().map_err(|err| {
            tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
            err
        })?;

        // Index the control relations targeting this switch.
        let objects = self.topo.list(Some(KIND_CONTROLS)).await.map_err(|err| {
            tracing::warn!(target_id = %target_id, error = %err, "updating mastership state for target failed");
            err
        })?;
        let target_relations: HashMap<String, Object> = objects
            .into_iter()
            .filter(|object| object.relation().map(|relation| relation.tgt_entity_id == target_id).unwrap_or(false))
            .map(|object| (object.id.clone(), object))
            .collect();

        let mut mastership = target.get_aspect::<P4RtMastershipState>().unwrap_or_default();

        // The sitting primary still holds a live relation; nothing to do.
        if target_relations.contains_key(&mastership.node_id) {
            return Ok(Reconciliation::done());
        }

        if target_relations.is_empty() {
            if mastership.node_id.is_empty() {
                return Ok(Reconciliation::done());
            }
            tracing::info!(target_id = %target_id, term = mastership.term, "master in term resigned for the P4RT target");
            mastership.node_id = String::new();
            target.set_aspect(&mastership)?;
            return match self.topo.update(target).await {
                Ok(_) => Ok(Reconciliation::done()),
                // A concurrent writer already advanced the entity; the next
                // event will re-reconcile against current state.
                Err(err) if err.is_not_found() || err.is_conflict() => {
                    tracing::warn!(target_id = %target_id, error = %err, "updating mastership state for target failed");
                    Ok(Reconciliation::done())
                }
                Err(err) => {
                    tracing::warn!(target_id = %target_id, error = %err, "updating mastership state for target failed");
                    Err(err)
                }
            };
        }

        let conn = match self.conns.get_by_target(&target_id) {
            Ok(conn) => conn,
            Err(err) if err.is_not_found() => return Ok(Reconciliation::done()),
            Err(err) => {
                tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
                return Err(err);
            }
        };

        let election_id = mastership.term + 1;
        let role_name = controller_info.role.map(|role| role.name).unwrap_or_default();
        tracing::info!(target_id = %target_id, election_id = election_id, "sending MasterArbitrationUpdate message");
        if let Err(err) = conn.send_arbitration_request(server_info.device_id, election_id, &role_name).await {
            if err.is_not_found() || err.is_invalid() {
                tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
                return Ok(Reconciliation::done());
            }
            tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
            return Err(err);
        }
        let response = match conn.recv_arbitration_response().await {
            Ok(Some(response)) => response,
            // The stream EOFed mid-election; the reconnect will trigger a
            // fresh attempt.
            Ok(None) => {
                tracing::warn!(target_id = %target_id, "end of arbitration stream");
                return Ok(Reconciliation::done());
            }
            // The election ID is already in use for this (device, role); the
            // next mastership-state event drives a fresh attempt.
            Err(err) if err.is_invalid() => {
                tracing::warn!(target_id = %target_id, error = %err, "invalid argument, failed to reconcile mastership election for the P4RT target");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(target_id = %target_id, error = %err, "failed to reconcile mastership election for the P4RT target");
                return Err(err);
            }
        };

        // Status is OK only on the elected primary; backups see
        // ALREADY_EXISTS when a primary exists and NOT_FOUND when none does.
        let status_code = response.status.as_ref().map(|status| status.code).unwrap_or_default();
        if status_code == crate::grpc::p4rt::Code::Ok as i32 {
            for relation_object in target_relations.values() {
                let relation = match relation_object.relation() {
                    Some(relation) => relation,
                    None => continue,
                };
                if relation.src_entity_id != self.controller_id {
                    continue;
                }
                let accepted_term = response.election_id.as_ref().map(|id| id.low).unwrap_or(election_id);
                tracing::info!(target_id = %target_id, election_id = accepted_term, "current node is selected as master, updating mastership state");
                mastership.node_id = relation_object.id.clone();
                mastership.term = accepted_term;
                target.set_aspect(&mastership)?;
                return match self.topo.update(target).await {
                    Ok(_) => Ok(Reconciliation::done()),
                    Err(err) if err.is_not_found() || err.is_conflict() => {
                        tracing::warn!(target_id = %target_id, error = %err, "updating mastership state for P4RT target failed");
                        Ok(Reconciliation::done())
                    }
                    Err(err) => {
                        tracing::warn!(target_id = %target_id, error = %err, "updating mastership state for P4RT target failed");
                        Err(err)
                    }
                };
            }
            Ok(Reconciliation::done())
        } else if status_code == crate::grpc::p4rt::Code::AlreadyExists as i32 {
            tracing::info!(target_id = %target_id, "master is already selected for target");
            Ok(Reconciliation::done())
        } else if status_code == crate::grpc::p4rt::Code::NotFound as i32 {
            tracing::info!(target_id = %target_id, "no master found for target, retrying master arbitration update request");
            Ok(Reconciliation::requeue(target_id))
        } else {
            Ok(Reconciliation::done())
        }
    }
}
