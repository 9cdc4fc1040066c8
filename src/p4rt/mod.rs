//! Southbound P4Runtime sessions & their lifecycle.

mod client;
mod manager;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::grpc::p4rt::{
    CapabilitiesResponse, Entity, GetForwardingPipelineConfigRequest, GetForwardingPipelineConfigResponse, MasterArbitrationUpdate, ReadRequest,
    SetForwardingPipelineConfigRequest, SetForwardingPipelineConfigResponse, WriteRequest, WriteResponse,
};

pub use client::P4rtSession;
pub use manager::ConnManager;

/// The ID of a southbound connection.
///
/// This is the same value recorded as the control-relation ID in topology,
/// and therefore the value mastership state's `node_id` refers to.
pub type ConnId = String;

/// Mint a fresh connection ID.
pub fn new_conn_id() -> ConnId {
    format!("uuid:{}", Uuid::new_v4())
}

/// A P4Runtime session with a single switch.
///
/// Arbitration send/recv are paired per election attempt; unary calls may
/// proceed concurrently with the stream.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// The connection ID of this session.
    fn id(&self) -> &str;
    /// The topology entity ID of the switch this session talks to.
    fn target_id(&self) -> &str;

    /// Send a primary-arbitration request on the stream channel.
    async fn send_arbitration_request(&self, device_id: u64, election_id: u64, role: &str) -> AppResult<()>;
    /// Receive the next arbitration response from the stream channel.
    ///
    /// Returns `Ok(None)` when the stream reached EOF mid-election, which
    /// callers treat as a no-op for the tick.
    async fn recv_arbitration_response(&self) -> AppResult<Option<MasterArbitrationUpdate>>;

    /// Set the forwarding-pipeline config of the switch.
    async fn set_forwarding_pipeline_config(&self, request: SetForwardingPipelineConfigRequest) -> AppResult<SetForwardingPipelineConfigResponse>;
    /// Get the current forwarding-pipeline config of the switch.
    async fn get_forwarding_pipeline_config(&self, request: GetForwardingPipelineConfigRequest) -> AppResult<GetForwardingPipelineConfigResponse>;
    /// Update one or more P4 entities on the switch.
    async fn write(&self, request: WriteRequest) -> AppResult<WriteResponse>;
    /// Read entities from the switch, aggregating the response stream.
    async fn read_entities(&self, request: ReadRequest) -> AppResult<Vec<Entity>>;
    /// Discover the capabilities of the P4Runtime server implementation.
    async fn capabilities(&self) -> AppResult<CapabilitiesResponse>;

    /// Release the session.
    async fn close(&self) -> AppResult<()>;
}

/// A shared handle to a live session.
pub type Conn = Arc<dyn Session>;
