use std::sync::Arc;

use anyhow::Result;

use super::pipeliner::PipelinerReconciler;
use super::Reconciler;
use crate::config::Config;
use crate::database::Database;
use crate::fixtures::{sample_p4info, switch_object, write_plugin_artifact, MemoryTopoStore};
use crate::kv::SledMap;
use crate::models::p4rt::PipelineConfigState;
use crate::plugin::P4PluginRegistry;
use crate::store::pipeline_config::PipelineConfigStore;
use crate::topo::TopoStore;
use crate::utils;

struct Harness {
    store: PipelineConfigStore,
    reconciler: PipelinerReconciler,
    _tmpdir: tempfile::TempDir,
}

/// Topology with switch `sw1` declaring pipeline `(basic, 1.0.0, v1model)`,
/// and a registry carrying the matching plugin with device binary 0xAA 0xBB.
async fn harness(register_plugin: bool) -> Result<Harness> {
    let (config, tmpdir) = Config::new_test()?;
    let topo = MemoryTopoStore::new();
    topo.create(switch_object("sw1", 1, &[("basic", "1.0.0", "v1model")])).await?;

    let registry = Arc::new(P4PluginRegistry::new());
    if register_plugin {
        let artifact = write_plugin_artifact(tmpdir.path(), "basic", "1.0.0", "v1model", Some(&[0xaa, 0xbb]))?;
        registry.register_plugin(&artifact)?;
    }

    let db = Database::new(config).await?;
    let map = Arc::new(SledMap::new(db.get_pipeline_config_tree().await?));
    let store = PipelineConfigStore::new(map).await?;

    let reconciler = PipelinerReconciler::new(topo, store.clone(), registry);
    Ok(Harness {
        store,
        reconciler,
        _tmpdir: tmpdir,
    })
}

#[tokio::test]
async fn declared_pipeline_materializes_a_pending_record() -> Result<()> {
    let harness = harness(true).await?;

    harness.reconciler.reconcile("sw1".into()).await?;

    let record = harness.store.get("sw1-basic-1.0.0-v1model").await?;
    assert!(record.target_id == "sw1", "expected target sw1 got {}", record.target_id);
    assert!(record.state() == PipelineConfigState::Pending, "expected Pending got {:?}", record.state());
    assert!(record.revision == 1, "expected revision 1 got {}", record.revision);

    let spec = record.spec.expect("expected record spec to be populated");
    assert!(spec.p4_device_config == vec![0xaa, 0xbb], "unexpected device config {:?}", spec.p4_device_config);
    let expected_p4info = utils::encode_model(&sample_p4info("basic", "1.0.0", "v1model"))?;
    assert!(spec.p4_info == expected_p4info, "expected canonical P4Info bytes to be stored");
    Ok(())
}

#[tokio::test]
async fn repeated_ticks_create_exactly_one_record() -> Result<()> {
    let harness = harness(true).await?;

    harness.reconciler.reconcile("sw1".into()).await?;
    harness.reconciler.reconcile("sw1".into()).await?;
    harness.reconciler.reconcile("sw1".into()).await?;

    let records = harness.store.list().await?;
    assert!(records.len() == 1, "expected 1 record got {}", records.len());
    assert!(records[0].revision == 1, "expected the record to be untouched, got revision {}", records[0].revision);
    Ok(())
}

#[tokio::test]
async fn missing_plugin_surfaces_the_error() -> Result<()> {
    let harness = harness(false).await?;

    let err = harness.reconciler.reconcile("sw1".into()).await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound got {:?}", err);

    let records = harness.store.list().await?;
    assert!(records.is_empty(), "expected no records got {}", records.len());
    Ok(())
}

#[tokio::test]
async fn switch_without_declared_pipelines_is_a_noop() -> Result<()> {
    let harness = harness(true).await?;
    let topo = MemoryTopoStore::new();
    topo.create(switch_object("sw2", 2, &[])).await?;
    let reconciler = PipelinerReconciler::new(topo, harness.store.clone(), Arc::new(P4PluginRegistry::new()));

    let result = reconciler.reconcile("sw2".into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");

    let records = harness.store.list().await?;
    assert!(records.is_empty(), "expected no records got {}", records.len());
    Ok(())
}

#[tokio::test]
async fn missing_switch_is_a_noop() -> Result<()> {
    let harness = harness(true).await?;
    harness.reconciler.reconcile("sw-unknown".into()).await?;
    let records = harness.store.list().await?;
    assert!(records.is_empty(), "expected no records got {}", records.len());
    Ok(())
}
