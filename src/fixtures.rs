//! Shared test fixtures.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::error::{AppError, AppResult};
use crate::grpc::p4info::{action, Action, ActionRef, MatchField, P4Info, PkgInfo, Preamble, Table};
use crate::grpc::p4rt::{
    CapabilitiesResponse, Entity, GetForwardingPipelineConfigRequest, GetForwardingPipelineConfigResponse, MasterArbitrationUpdate, ReadRequest,
    SetForwardingPipelineConfigRequest, SetForwardingPipelineConfigResponse, Status, Uint128, WriteRequest, WriteResponse,
};
use crate::grpc::topo::{Endpoint, Event, EventType, Object, P4PipelineInfo, P4RtServerInfo};
use crate::grpc::KIND_SWITCH;
use crate::p4rt::{ConnId, Session};
use crate::topo::TopoStore;
use crate::utils;

/// An in-memory topology store with revision-checked writes and a broadcast
/// watch stream.
pub struct MemoryTopoStore {
    objects: Mutex<HashMap<String, Object>>,
    revision: AtomicU64,
    events: broadcast::Sender<Event>,
}

impl MemoryTopoStore {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(100);
        Arc::new(Self {
            objects: Mutex::new(HashMap::new()),
            revision: AtomicU64::new(0),
            events,
        })
    }

    fn emit(&self, r#type: EventType, object: Object) {
        let _ = self.events.send(Event {
            r#type: r#type as i32,
            object: Some(object),
        });
    }
}

#[async_trait]
impl TopoStore for MemoryTopoStore {
    async fn get(&self, id: &str) -> AppResult<Object> {
        self.objects
            .lock()
            .expect("topo fixture lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("object '{}' not found", id)))
    }

    async fn list(&self, kind: Option<&str>) -> AppResult<Vec<Object>> {
        let objects = self.objects.lock().expect("topo fixture lock poisoned");
        Ok(objects
            .values()
            .filter(|object| kind.map(|kind| object.kind_id() == kind).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn create(&self, mut object: Object) -> AppResult<Object> {
        let mut objects = self.objects.lock().expect("topo fixture lock poisoned");
        if objects.contains_key(&object.id) {
            return Err(AppError::AlreadyExists(format!("object '{}' already exists", object.id)));
        }
        object.revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        objects.insert(object.id.clone(), object.clone());
        drop(objects);
        self.emit(EventType::Added, object.clone());
        Ok(object)
    }

    async fn update(&self, mut object: Object) -> AppResult<Object> {
        let mut objects = self.objects.lock().expect("topo fixture lock poisoned");
        let current = objects
            .get(&object.id)
            .ok_or_else(|| AppError::NotFound(format!("object '{}' not found", object.id)))?;
        if current.revision != object.revision {
            return Err(AppError::Conflict(format!(
                "object '{}' is at revision {}, update carries {}",
                object.id, current.revision, object.revision
            )));
        }
        object.revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        objects.insert(object.id.clone(), object.clone());
        drop(objects);
        self.emit(EventType::Updated, object.clone());
        Ok(object)
    }

    async fn delete(&self, id: &str, _revision: u64) -> AppResult<()> {
        let removed = self.objects.lock().expect("topo fixture lock poisoned").remove(id);
        match removed {
            Some(object) => {
                self.emit(EventType::Removed, object);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("object '{}' not found", id))),
        }
    }

    async fn watch(&self) -> AppResult<mpsc::Receiver<Event>> {
        let (tx, rx) = mpsc::channel(100);
        let mut events = self.events.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

/// A scripted southbound session.
///
/// Arbitration responses and set-forwarding results are popped from queues
/// seeded by the test; every request is recorded for assertion.
pub struct FakeSession {
    id: ConnId,
    target_id: String,
    arbitration_responses: Mutex<VecDeque<AppResult<Option<MasterArbitrationUpdate>>>>,
    set_results: Mutex<VecDeque<AppResult<SetForwardingPipelineConfigResponse>>>,
    pub sent_arbitrations: Mutex<Vec<(u64, u64, String)>>,
    pub set_requests: Mutex<Vec<SetForwardingPipelineConfigRequest>>,
}

impl FakeSession {
    pub fn new(id: impl Into<ConnId>, target_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            target_id: target_id.into(),
            arbitration_responses: Mutex::new(VecDeque::new()),
            set_results: Mutex::new(VecDeque::new()),
            sent_arbitrations: Mutex::new(Vec::new()),
            set_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push_arbitration_response(&self, response: AppResult<Option<MasterArbitrationUpdate>>) {
        self.arbitration_responses.lock().expect("fixture lock poisoned").push_back(response);
    }

    pub fn push_set_result(&self, result: AppResult<SetForwardingPipelineConfigResponse>) {
        self.set_results.lock().expect("fixture lock poisoned").push_back(result);
    }
}

#[async_trait]
impl Session for FakeSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn send_arbitration_request(&self, device_id: u64, election_id: u64, role: &str) -> AppResult<()> {
        self.sent_arbitrations
            .lock()
            .expect("fixture lock poisoned")
            .push((device_id, election_id, role.to_string()));
        Ok(())
    }

    async fn recv_arbitration_response(&self) -> AppResult<Option<MasterArbitrationUpdate>> {
        self.arbitration_responses
            .lock()
            .expect("fixture lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Internal("no scripted arbitration response".into())))
    }

    async fn set_forwarding_pipeline_config(&self, request: SetForwardingPipelineConfigRequest) -> AppResult<SetForwardingPipelineConfigResponse> {
        self.set_requests.lock().expect("fixture lock poisoned").push(request);
        self.set_results
            .lock()
            .expect("fixture lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(SetForwardingPipelineConfigResponse {}))
    }

    async fn get_forwarding_pipeline_config(&self, _request: GetForwardingPipelineConfigRequest) -> AppResult<GetForwardingPipelineConfigResponse> {
        Ok(GetForwardingPipelineConfigResponse { config: None })
    }

    async fn write(&self, _request: WriteRequest) -> AppResult<WriteResponse> {
        Ok(WriteResponse {})
    }

    async fn read_entities(&self, _request: ReadRequest) -> AppResult<Vec<Entity>> {
        Ok(Vec::new())
    }

    async fn capabilities(&self) -> AppResult<CapabilitiesResponse> {
        Ok(CapabilitiesResponse {
            p4runtime_api_version: "1.3.0".into(),
        })
    }

    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Build an arbitration response with the given status code & election ID.
pub fn arbitration_response(code: crate::grpc::p4rt::Code, election_low: u64) -> MasterArbitrationUpdate {
    MasterArbitrationUpdate {
        device_id: 0,
        role: None,
        election_id: Some(Uint128 {
            high: 0,
            low: election_low,
        }),
        status: Some(Status {
            code: code as i32,
            message: String::new(),
        }),
    }
}

/// Build a switch entity declaring the given pipeline.
pub fn switch_object(id: &str, device_id: u64, pipelines: &[(&str, &str, &str)]) -> Object {
    let mut switch = Object::new_entity(id, KIND_SWITCH);
    switch
        .set_aspect(&P4RtServerInfo {
            control_endpoint: Some(Endpoint {
                address: format!("{}.fabric", id),
                port: 9559,
            }),
            device_id,
            pipelines: pipelines
                .iter()
                .map(|(name, version, architecture)| P4PipelineInfo {
                    name: (*name).into(),
                    version: (*version).into(),
                    architecture: (*architecture).into(),
                })
                .collect(),
        })
        .expect("error encoding P4RT server info fixture");
    switch
}

/// A small but non-trivial P4Info for the given pipeline identity.
pub fn sample_p4info(name: &str, version: &str, arch: &str) -> P4Info {
    P4Info {
        pkg_info: Some(PkgInfo {
            name: name.into(),
            version: version.into(),
            annotations: Vec::new(),
            arch: arch.into(),
            organization: "p4.org".into(),
            contact: String::new(),
        }),
        tables: vec![Table {
            preamble: Some(Preamble {
                id: 33581985,
                name: "ingress.table0".into(),
                alias: "table0".into(),
                annotations: Vec::new(),
            }),
            match_fields: vec![MatchField {
                id: 1,
                name: "hdr.ethernet.dst_addr".into(),
                bitwidth: 48,
                match_type: crate::grpc::p4info::match_field::MatchType::Ternary as i32,
            }],
            action_refs: vec![ActionRef { id: 16794308 }],
            size: 1024,
        }],
        actions: vec![Action {
            preamble: Some(Preamble {
                id: 16794308,
                name: "ingress.set_egress_port".into(),
                alias: "set_egress_port".into(),
                annotations: Vec::new(),
            }),
            params: vec![action::Param {
                id: 1,
                name: "port".into(),
                bitwidth: 9,
            }],
        }],
    }
}

/// Write a plugin artifact pair into `dir`, returning its artifact reference.
pub fn write_plugin_artifact(dir: &Path, name: &str, version: &str, arch: &str, device_config: Option<&[u8]>) -> Result<String> {
    let p4info = sample_p4info(name, version, arch);
    let p4info_path = dir.join(format!("{}.p4info.bin", name));
    std::fs::write(&p4info_path, utils::encode_model(&p4info)?).context("error writing P4Info artifact")?;
    match device_config {
        Some(device_config) => {
            let device_config_path = dir.join(format!("{}.bin", name));
            std::fs::write(&device_config_path, device_config).context("error writing device config artifact")?;
            Ok(format!("{}:{}", p4info_path.display(), device_config_path.display()))
        }
        None => Ok(p4info_path.display().to_string()),
    }
}
