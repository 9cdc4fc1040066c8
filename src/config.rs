//! Runtime configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The server's logging config, which uses Rust's `env_logger` directives.
    pub rust_log: String,
    /// The port which the gRPC server is to use.
    pub grpc_port: u16,

    /// The `host:port` of the topology service.
    #[serde(default = "default_topo_address")]
    pub topo_address: String,
    /// Path to the CA certificate used for client TLS.
    #[serde(default)]
    pub ca_path: Option<String>,
    /// Path to the client TLS key.
    #[serde(default)]
    pub key_path: Option<String>,
    /// Path to the client TLS certificate.
    #[serde(default)]
    pub cert_path: Option<String>,

    /// P4 plugin artifact references, each `<p4info-path>[:<device-config-path>]`.
    #[serde(default)]
    pub p4_plugins: Vec<String>,

    /// The name of the pod on which this instance is running.
    pub pod_name: String,
    /// The unique ID of the pod, from which the controller identity is derived.
    pub pod_id: String,

    /// The path to the database on disk.
    #[serde(default = "crate::database::default_data_path")]
    pub storage_data_path: String,
}

impl Config {
    /// Create a new config instance from the runtime environment.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        Ok(config)
    }

    /// Build an instance for use in tests.
    #[cfg(test)]
    pub fn new_test() -> Result<(Arc<Self>, tempfile::TempDir)> {
        let tmpdir = tempfile::tempdir_in("/tmp").context("error creating tmp dir in /tmp")?;
        Ok((
            Arc::new(Self {
                rust_log: "".into(),
                grpc_port: 5150,
                topo_address: "onos-topo:5150".into(),
                ca_path: None,
                key_path: None,
                cert_path: None,
                p4_plugins: Vec::new(),
                pod_name: "testing-0".into(),
                pod_id: "testing-0".into(),
                storage_data_path: tmpdir.path().to_string_lossy().to_string(),
            }),
            tmpdir,
        ))
    }
}

/// The default `host:port` of the topology service.
fn default_topo_address() -> String {
    "onos-topo:5150".to_string()
}
