//! Durable pipeline-configuration records & their change events.

/// The ID of a pipeline-config record.
pub type PipelineConfigId = String;
/// The ID of a P4 programmable target.
pub type TargetId = String;

/// Derive the stable record ID for a `(target, pipeline)` pair.
///
/// The format is shared by every controller replica; records rendezvous on it.
pub fn new_pipeline_config_id(target_id: &str, name: &str, version: &str, arch: &str) -> PipelineConfigId {
    format!("{}-{}-{}-{}", target_id, name, version, arch)
}

/// A desired forwarding-pipeline config for a single target.
///
/// Stored prost-encoded in the replicated map; `id` and `version` are
/// re-stamped from the backing entry on every decode.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineConfig {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    /// The switch this config is destined for.
    #[prost(string, tag = "2")]
    pub target_id: ::prost::alloc::string::String,
    #[prost(enumeration = "ConfigurationAction", tag = "3")]
    pub action: i32,
    #[prost(message, optional, tag = "4")]
    pub spec: ::core::option::Option<PipelineConfigSpec>,
    #[prost(message, optional, tag = "5")]
    pub status: ::core::option::Option<PipelineConfigStatus>,
    /// Logical write counter, starting at 1 on create.
    #[prost(uint64, tag = "6")]
    pub revision: u64,
    /// Unix timestamp of record creation.
    #[prost(int64, tag = "7")]
    pub created: i64,
    /// Unix timestamp of the last record write.
    #[prost(int64, tag = "8")]
    pub updated: i64,
    /// The store's optimistic-concurrency token; overwritten on decode with
    /// the backing entry's write revision.
    #[prost(uint64, tag = "9")]
    pub version: u64,
}
/// The material to install: P4Info plus the device binary, both as raw bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineConfigSpec {
    #[prost(bytes = "vec", tag = "1")]
    pub p4_info: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub p4_device_config: ::prost::alloc::vec::Vec<u8>,
}
/// Where the record is in its install lifecycle.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineConfigStatus {
    #[prost(enumeration = "PipelineConfigState", tag = "1")]
    pub state: i32,
}
/// The pipeline-config install action. Only verify-and-commit is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ConfigurationAction {
    VerifyAndCommit = 0,
}
/// Record lifecycle states. `Failed` is terminal absent a new create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PipelineConfigState {
    Pending = 0,
    Complete = 1,
    Failed = 2,
}

impl PipelineConfig {
    /// The record's lifecycle state, defaulting to pending when unset.
    pub fn state(&self) -> PipelineConfigState {
        self.status
            .as_ref()
            .and_then(|status| PipelineConfigState::from_i32(status.state))
            .unwrap_or(PipelineConfigState::Pending)
    }

    /// Set the record's lifecycle state.
    pub fn set_state(&mut self, state: PipelineConfigState) {
        self.status = Some(PipelineConfigStatus { state: state as i32 });
    }
}

/// The kind of store change an event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigurationEventType {
    /// The record was first observed.
    Created,
    /// The record advanced to a newer revision.
    Updated,
    /// The record was emitted as part of a watch replay snapshot.
    Replayed,
}

/// A change event published by the pipeline-config store.
#[derive(Clone, Debug)]
pub struct ConfigurationEvent {
    pub r#type: ConfigurationEventType,
    pub pipeline_config: PipelineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_config_id_format_is_stable() {
        let id = new_pipeline_config_id("sw1", "basic", "1.0.0", "v1model");
        assert!(id == "sw1-basic-1.0.0-v1model", "unexpected record ID {}", id);
    }

    #[test]
    fn state_defaults_to_pending() {
        let config = PipelineConfig::default();
        assert!(config.state() == PipelineConfigState::Pending, "expected Pending got {:?}", config.state());
    }
}
