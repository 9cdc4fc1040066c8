//! The P4 plugin registry.
//!
//! Plugins map a pipeline identity to its compiled artifacts. They are
//! resolved once at startup from artifact references of the form
//! `<p4info-path>[:<device-config-path>]`; the registry is read-mostly
//! thereafter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{AppError, AppResult};
use crate::grpc::p4info::{P4Info, PkgInfo};
use crate::utils;

/// The ID of a registered plugin, derived from its package info.
pub type P4PluginId = String;

/// Derive a plugin ID from a pipeline identity.
pub fn new_plugin_id(name: &str, version: &str, arch: &str) -> P4PluginId {
    format!("{}-{}-{}", name, version, arch)
}

/// A P4 program's compiled artifacts.
#[derive(Debug)]
pub struct P4Plugin {
    pkg_info: PkgInfo,
    p4info: P4Info,
    device_config: Option<Vec<u8>>,
}

impl P4Plugin {
    /// The package info embedded in the program's P4Info.
    pub fn get_pkg_info(&self) -> PkgInfo {
        self.pkg_info.clone()
    }

    /// The structured P4Info of the program.
    pub fn get_p4_info(&self) -> P4Info {
        self.p4info.clone()
    }

    /// The target-specific device config blob.
    pub fn get_p4_device_config(&self) -> AppResult<Vec<u8>> {
        self.device_config
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("plugin '{}' carries no device config", new_plugin_id(&self.pkg_info.name, &self.pkg_info.version, &self.pkg_info.arch))))
    }
}

/// Registry of P4 plugins keyed by `(name, version, arch)`.
#[derive(Default)]
pub struct P4PluginRegistry {
    plugins: RwLock<HashMap<P4PluginId, Arc<P4Plugin>>>,
}

impl P4PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a plugin by ID.
    pub fn get_plugin(&self, id: &str) -> AppResult<Arc<P4Plugin>> {
        self.plugins
            .read()
            .expect("plugin registry lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("P4 plugin with ID '{}' not found", id)))
    }

    /// Get all registered plugins.
    pub fn get_plugins(&self) -> HashMap<P4PluginId, Arc<P4Plugin>> {
        self.plugins.read().expect("plugin registry lock poisoned").clone()
    }

    /// Register the plugin described by the given artifact reference.
    ///
    /// The plugin ID is derived from the pkg-info embedded in the artifact's
    /// P4Info and must be unique.
    pub fn register_plugin(&self, artifact: &str) -> AppResult<P4PluginId> {
        tracing::info!(artifact = %artifact, "loading P4 plugin");
        let mut parts = artifact.splitn(2, ':');
        let p4info_path = parts.next().filter(|path| !path.is_empty()).ok_or_else(|| {
            AppError::Invalid(format!("artifact reference '{}' carries no P4Info path", artifact))
        })?;
        let device_config_path = parts.next().filter(|path| !path.is_empty());

        let p4info_bytes =
            std::fs::read(p4info_path).map_err(|err| AppError::Invalid(format!("unable to read P4Info from '{}': {}", p4info_path, err)))?;
        let p4info: P4Info =
            utils::decode_model(&p4info_bytes).map_err(|err| AppError::Invalid(format!("unable to decode P4Info from '{}': {}", p4info_path, err)))?;
        let pkg_info = p4info
            .pkg_info
            .clone()
            .ok_or_else(|| AppError::Invalid(format!("P4Info from '{}' carries no pkg info", p4info_path)))?;
        if pkg_info.name.is_empty() || pkg_info.version.is_empty() || pkg_info.arch.is_empty() {
            return Err(AppError::Invalid(format!("P4Info from '{}' has incomplete pkg info", p4info_path)));
        }

        let device_config = match device_config_path {
            Some(path) => Some(std::fs::read(path).map_err(|err| AppError::Invalid(format!("unable to read device config from '{}': {}", path, err)))?),
            None => None,
        };

        let plugin_id = new_plugin_id(&pkg_info.name, &pkg_info.version, &pkg_info.arch);
        tracing::info!(plugin_id = %plugin_id, "registering a P4 plugin");
        let mut plugins = self.plugins.write().expect("plugin registry lock poisoned");
        if plugins.contains_key(&plugin_id) {
            return Err(AppError::AlreadyExists(format!("P4 plugin with ID '{}' is already registered", plugin_id)));
        }
        plugins.insert(
            plugin_id.clone(),
            Arc::new(P4Plugin {
                pkg_info,
                p4info,
                device_config,
            }),
        );
        Ok(plugin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use anyhow::Result;

    #[test]
    fn register_derives_id_from_pkg_info() -> Result<()> {
        let tmpdir = tempfile::tempdir_in("/tmp")?;
        let artifact = fixtures::write_plugin_artifact(tmpdir.path(), "basic", "1.0.0", "v1model", Some(&[0xaa, 0xbb]))?;

        let registry = P4PluginRegistry::new();
        let plugin_id = registry.register_plugin(&artifact)?;
        assert!(plugin_id == "basic-1.0.0-v1model", "unexpected plugin ID {}", plugin_id);

        let plugin = registry.get_plugin(&plugin_id)?;
        let pkg_info = plugin.get_pkg_info();
        assert!(pkg_info.name == "basic", "expected name basic got {}", pkg_info.name);
        let device_config = plugin.get_p4_device_config()?;
        assert!(device_config == vec![0xaa, 0xbb], "unexpected device config {:?}", device_config);
        Ok(())
    }

    #[test]
    fn register_without_device_config_reports_not_found() -> Result<()> {
        let tmpdir = tempfile::tempdir_in("/tmp")?;
        let artifact = fixtures::write_plugin_artifact(tmpdir.path(), "basic", "1.0.0", "v1model", None)?;

        let registry = P4PluginRegistry::new();
        let plugin_id = registry.register_plugin(&artifact)?;
        let plugin = registry.get_plugin(&plugin_id)?;
        let err = plugin.get_p4_device_config().unwrap_err();
        assert!(err.is_not_found(), "expected NotFound got {:?}", err);
        Ok(())
    }

    #[test]
    fn duplicate_registration_is_rejected() -> Result<()> {
        let tmpdir = tempfile::tempdir_in("/tmp")?;
        let artifact = fixtures::write_plugin_artifact(tmpdir.path(), "basic", "1.0.0", "v1model", None)?;

        let registry = P4PluginRegistry::new();
        registry.register_plugin(&artifact)?;
        let err = registry.register_plugin(&artifact).unwrap_err();
        assert!(err.is_already_exists(), "expected AlreadyExists got {:?}", err);
        Ok(())
    }

    #[test]
    fn unknown_plugin_is_not_found() {
        let registry = P4PluginRegistry::new();
        let err = registry.get_plugin("missing-1.0.0-v1model").unwrap_err();
        assert!(err.is_not_found(), "expected NotFound got {:?}", err);
    }

    #[test]
    fn get_plugins_lists_registered_plugins() -> Result<()> {
        let tmpdir = tempfile::tempdir_in("/tmp")?;
        let first = fixtures::write_plugin_artifact(tmpdir.path(), "basic", "1.0.0", "v1model", None)?;
        let second = fixtures::write_plugin_artifact(tmpdir.path(), "fabric", "0.2.0", "v1model", None)?;

        let registry = P4PluginRegistry::new();
        registry.register_plugin(&first)?;
        registry.register_plugin(&second)?;
        let plugins = registry.get_plugins();
        assert!(plugins.len() == 2, "expected 2 plugins got {}", plugins.len());
        Ok(())
    }
}
