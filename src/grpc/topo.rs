///////////////////////////////////////////////////////////////////////////////
// Objects ////////////////////////////////////////////////////////////////////

/// A serialized aspect value attached to a topology object.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    /// The type URL identifying the aspect kind, e.g. `onos.topo.P4RTServerInfo`.
    #[prost(string, tag = "1")]
    pub type_url: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}
/// A topology object: an entity (switch, controller) or a relation between two.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Object {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    /// The object's write revision, used as an optimistic-concurrency token on
    /// updates.
    #[prost(uint64, tag = "2")]
    pub revision: u64,
    #[prost(oneof = "object::Obj", tags = "3, 4")]
    pub obj: ::core::option::Option<object::Obj>,
    /// Aspects attached to the object, keyed by type URL.
    #[prost(map = "string, message", tag = "6")]
    pub aspects: ::std::collections::HashMap<::prost::alloc::string::String, Any>,
}
/// Nested message and enum types in `Object`.
pub mod object {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Obj {
        #[prost(message, tag = "3")]
        Entity(super::Entity),
        #[prost(message, tag = "4")]
        Relation(super::Relation),
    }
}
/// An entity in the topology graph.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entity {
    #[prost(string, tag = "1")]
    pub kind_id: ::prost::alloc::string::String,
}
/// A directed relation between two entities.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Relation {
    #[prost(string, tag = "1")]
    pub kind_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub src_entity_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub tgt_entity_id: ::prost::alloc::string::String,
}
//////////////////////////////////////////////////////////////////////////////
// Aspects ///////////////////////////////////////////////////////////////////

/// P4Runtime server details declared on a switch entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct P4RtServerInfo {
    #[prost(message, optional, tag = "1")]
    pub control_endpoint: ::core::option::Option<Endpoint>,
    /// The numeric device ID required by every P4Runtime request.
    #[prost(uint64, tag = "2")]
    pub device_id: u64,
    /// The pipelines the switch declares as desired state.
    #[prost(message, repeated, tag = "3")]
    pub pipelines: ::prost::alloc::vec::Vec<P4PipelineInfo>,
}
/// A network endpoint.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endpoint {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
}
/// The identity of a compiled pipeline.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct P4PipelineInfo {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub architecture: ::prost::alloc::string::String,
}
/// The mastership outcome recorded on a switch entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct P4RtMastershipState {
    /// The control-relation ID of the current primary, empty when none.
    #[prost(string, tag = "1")]
    pub node_id: ::prost::alloc::string::String,
    /// The election ID accepted by the switch; never decreases.
    #[prost(uint64, tag = "2")]
    pub term: u64,
}
/// TLS options for dialing a switch's control endpoint.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TlsOptions {
    #[prost(bool, tag = "1")]
    pub insecure: bool,
    #[prost(bool, tag = "2")]
    pub plain: bool,
}
/// Marks an entity as accepting configuration from this control plane.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Configurable {}
/// Switch hardware details.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SwitchInfo {
    #[prost(string, tag = "1")]
    pub model_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub role: ::prost::alloc::string::String,
}
/// Details of a controller replica entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControllerInfo {
    #[prost(string, tag = "1")]
    pub uri: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub role: ::core::option::Option<ControllerRole>,
}
/// The role a controller replica contests mastership under.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControllerRole {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}
//////////////////////////////////////////////////////////////////////////////
// Requests & events /////////////////////////////////////////////////////////

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    #[prost(message, optional, tag = "1")]
    pub object: ::core::option::Option<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRequest {
    #[prost(message, optional, tag = "1")]
    pub filters: ::core::option::Option<Filters>,
}
/// Filters applied to a list operation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filters {
    #[prost(message, optional, tag = "1")]
    pub kind_filter: ::core::option::Option<Filter>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filter {
    #[prost(oneof = "filter::Filter", tags = "1")]
    pub filter: ::core::option::Option<filter::Filter>,
}
/// Nested message and enum types in `Filter`.
pub mod filter {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Filter {
        #[prost(message, tag = "1")]
        Equal(super::EqualFilter),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EqualFilter {
    #[prost(string, tag = "1")]
    pub value: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "1")]
    pub objects: ::prost::alloc::vec::Vec<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateRequest {
    #[prost(message, optional, tag = "1")]
    pub object: ::core::option::Option<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateResponse {
    #[prost(message, optional, tag = "1")]
    pub object: ::core::option::Option<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRequest {
    #[prost(message, optional, tag = "1")]
    pub object: ::core::option::Option<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateResponse {
    #[prost(message, optional, tag = "1")]
    pub object: ::core::option::Option<Object>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub revision: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteResponse {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WatchRequest {
    #[prost(bool, tag = "2")]
    pub noreplay: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WatchResponse {
    #[prost(message, optional, tag = "1")]
    pub event: ::core::option::Option<Event>,
}
/// A topology change event.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    #[prost(enumeration = "EventType", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub object: ::core::option::Option<Object>,
}
/// The kind of change an event describes. `None` marks replayed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    None = 0,
    Added = 1,
    Updated = 2,
    Removed = 3,
}
#[doc = r" Generated client implementations."]
pub mod topo_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[doc = " The topology service interface."]
    #[derive(Debug, Clone)]
    pub struct TopoClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl TopoClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> TopoClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + Send + Sync + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> TopoClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T: tonic::codegen::Service<http::Request<tonic::body::BoxBody>, Response = http::Response<<T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody>>,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error: Into<StdError> + Send + Sync,
        {
            TopoClient::new(InterceptedService::new(inner, interceptor))
        }
        #[doc = " Get an object by ID."]
        pub async fn get(&mut self, request: impl tonic::IntoRequest<super::GetRequest>) -> Result<tonic::Response<super::GetResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/Get");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " List objects, optionally filtered."]
        pub async fn list(&mut self, request: impl tonic::IntoRequest<super::ListRequest>) -> Result<tonic::Response<super::ListResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/List");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Create a new object."]
        pub async fn create(&mut self, request: impl tonic::IntoRequest<super::CreateRequest>) -> Result<tonic::Response<super::CreateResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/Create");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Update an existing object; the object's revision is the optimistic lock."]
        pub async fn update(&mut self, request: impl tonic::IntoRequest<super::UpdateRequest>) -> Result<tonic::Response<super::UpdateResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/Update");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Delete an object."]
        pub async fn delete(&mut self, request: impl tonic::IntoRequest<super::DeleteRequest>) -> Result<tonic::Response<super::DeleteResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/Delete");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Stream topology change events."]
        pub async fn watch(&mut self, request: impl tonic::IntoRequest<super::WatchRequest>) -> Result<tonic::Response<tonic::codec::Streaming<super::WatchResponse>>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/onos.topo.Topo/Watch");
            self.inner.server_streaming(request.into_request(), path, codec).await
        }
    }
}
