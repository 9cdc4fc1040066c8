//! Hand-maintained protobuf/gRPC types for the external interfaces.

pub mod p4info;
pub mod p4rt;
pub mod topo;
mod topo_ext;

pub use topo_ext::{AspectValue, KIND_CONTROLLER, KIND_CONTROLS, KIND_SWITCH};
