//! The production P4Runtime session.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tonic::codec::Streaming;
use tonic::transport::Channel;

use super::{ConnId, Session};
use crate::error::{AppError, AppResult};
use crate::grpc::p4rt::p4_runtime_client::P4RuntimeClient;
use crate::grpc::p4rt::{
    stream_message_request, stream_message_response, CapabilitiesRequest, CapabilitiesResponse, Entity, GetForwardingPipelineConfigRequest,
    GetForwardingPipelineConfigResponse, MasterArbitrationUpdate, ReadRequest, Role, SetForwardingPipelineConfigRequest,
    SetForwardingPipelineConfigResponse, StreamMessageRequest, Uint128, WriteRequest, WriteResponse,
};

/// Capacity of the stream-channel request buffer.
const STREAM_BUFFER: usize = 64;

/// A session over one gRPC channel and one multiplexed stream channel.
pub struct P4rtSession {
    id: ConnId,
    target_id: String,
    client: P4RuntimeClient<Channel>,
    stream_tx: mpsc::Sender<StreamMessageRequest>,
    stream_rx: Mutex<Streaming<crate::grpc::p4rt::StreamMessageResponse>>,
}

impl P4rtSession {
    /// Open a session on the given channel, establishing the stream channel
    /// immediately.
    pub async fn connect(channel: Channel, id: ConnId, target_id: String) -> AppResult<Self> {
        let mut client = P4RuntimeClient::new(channel);
        let (stream_tx, request_rx) = mpsc::channel(STREAM_BUFFER);
        let response = client
            .stream_channel(ReceiverStream::new(request_rx))
            .await
            .map_err(AppError::from_status)?;
        Ok(Self {
            id,
            target_id,
            client,
            stream_tx,
            stream_rx: Mutex::new(response.into_inner()),
        })
    }
}

#[async_trait]
impl Session for P4rtSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn send_arbitration_request(&self, device_id: u64, election_id: u64, role: &str) -> AppResult<()> {
        let role = if role.is_empty() {
            None
        } else {
            Some(Role {
                id: 0,
                name: role.to_string(),
            })
        };
        let request = StreamMessageRequest {
            update: Some(stream_message_request::Update::Arbitration(MasterArbitrationUpdate {
                device_id,
                role,
                election_id: Some(Uint128 {
                    high: 0,
                    low: election_id,
                }),
                status: None,
            })),
        };
        self.stream_tx
            .send(request)
            .await
            .map_err(|_| AppError::Unavailable(format!("stream channel to target '{}' is closed", self.target_id)))
    }

    async fn recv_arbitration_response(&self) -> AppResult<Option<MasterArbitrationUpdate>> {
        let mut stream = self.stream_rx.lock().await;
        loop {
            match stream.message().await {
                // Other stream message kinds may interleave with arbitration.
                Ok(Some(message)) => match message.update {
                    Some(stream_message_response::Update::Arbitration(arbitration)) => return Ok(Some(arbitration)),
                    None => continue,
                },
                Ok(None) => return Ok(None),
                Err(status) => return Err(AppError::from_status(status)),
            }
        }
    }

    async fn set_forwarding_pipeline_config(&self, request: SetForwardingPipelineConfigRequest) -> AppResult<SetForwardingPipelineConfigResponse> {
        let response = self
            .client
            .clone()
            .set_forwarding_pipeline_config(request)
            .await
            .map_err(AppError::from_status)?;
        Ok(response.into_inner())
    }

    async fn get_forwarding_pipeline_config(&self, request: GetForwardingPipelineConfigRequest) -> AppResult<GetForwardingPipelineConfigResponse> {
        let response = self
            .client
            .clone()
            .get_forwarding_pipeline_config(request)
            .await
            .map_err(AppError::from_status)?;
        Ok(response.into_inner())
    }

    async fn write(&self, request: WriteRequest) -> AppResult<WriteResponse> {
        let response = self.client.clone().write(request).await.map_err(AppError::from_status)?;
        Ok(response.into_inner())
    }

    async fn read_entities(&self, request: ReadRequest) -> AppResult<Vec<Entity>> {
        let response = self.client.clone().read(request).await.map_err(AppError::from_status)?;
        let mut stream = response.into_inner();
        let mut entities = Vec::new();
        loop {
            match stream.message().await {
                Ok(Some(batch)) => entities.extend(batch.entities),
                Ok(None) => break,
                Err(status) if status.code() == tonic::Code::Cancelled => break,
                Err(status) => return Err(AppError::from_status(status)),
            }
        }
        Ok(entities)
    }

    async fn capabilities(&self) -> AppResult<CapabilitiesResponse> {
        let response = self.client.clone().capabilities(CapabilitiesRequest {}).await.map_err(AppError::from_status)?;
        Ok(response.into_inner())
    }

    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}
