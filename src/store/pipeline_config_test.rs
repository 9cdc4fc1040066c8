use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::pipeline_config::{PipelineConfigStore, WatchOptions};
use crate::config::Config;
use crate::database::Database;
use crate::kv::SledMap;
use crate::models::p4rt::{
    new_pipeline_config_id, ConfigurationEvent, ConfigurationEventType, PipelineConfig, PipelineConfigSpec, PipelineConfigState,
};

/// Open two store handles over the same backing map, as two replicas would.
async fn new_stores() -> Result<(PipelineConfigStore, PipelineConfigStore, tempfile::TempDir)> {
    let (config, tmpdir) = Config::new_test()?;
    let db = Database::new(config).await?;
    let map = Arc::new(SledMap::new(db.get_pipeline_config_tree().await?));
    let store1 = PipelineConfigStore::new(map.clone()).await?;
    let store2 = PipelineConfigStore::new(map).await?;
    Ok((store1, store2, tmpdir))
}

fn new_config(target_id: &str, device_config: &[u8]) -> PipelineConfig {
    PipelineConfig {
        id: new_pipeline_config_id(target_id, "basic", "1.0.0", "v1model"),
        target_id: target_id.into(),
        spec: Some(PipelineConfigSpec {
            p4_info: b"p4info".to_vec(),
            p4_device_config: device_config.to_vec(),
        }),
        ..Default::default()
    }
}

async fn next_event(rx: &mut mpsc::Receiver<ConfigurationEvent>) -> ConfigurationEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out awaiting store event")
        .expect("store event channel closed")
}

#[tokio::test]
async fn store_lifecycle_across_two_replicas() -> Result<()> {
    let (store1, store2, _tmpdir) = new_stores().await?;

    let mut events = store2.watch(WatchOptions::default()).await?;

    let mut target1_config = new_config("target-1", &[]);
    let mut target2_config = new_config("target-2", &[]);
    let target1_id = target1_config.id.clone();
    let target2_id = target2_config.id.clone();

    store1.create(&mut target1_config).await?;
    assert!(target1_config.revision == 1, "expected revision 1 got {}", target1_config.revision);
    assert!(target1_config.version != 0, "expected a version to be assigned");

    store2.create(&mut target2_config).await?;
    assert!(target2_config.revision == 1, "expected revision 1 got {}", target2_config.revision);

    // Get from the other replica; spec bytes survive byte-for-byte.
    let fetched = store2.get(&target1_id).await?;
    assert!(fetched.id == target1_id, "expected ID {} got {}", target1_id, fetched.id);
    assert!(fetched.target_id == "target-1", "expected target-1 got {}", fetched.target_id);
    assert!(fetched.spec == target1_config.spec, "expected spec to roundtrip byte-equal");

    // Both creates were observed by the watcher.
    let event = next_event(&mut events).await;
    assert!(event.r#type == ConfigurationEventType::Created, "expected Created got {:?}", event.r#type);
    let event = next_event(&mut events).await;
    assert!(event.r#type == ConfigurationEventType::Created, "expected Created got {:?}", event.r#type);

    // Watch events for a specific record only.
    let mut target2_events = store1
        .watch(WatchOptions {
            pipeline_config_id: Some(target2_id.clone()),
            replay: false,
        })
        .await?;

    let revision = target2_config.revision;
    store1.update(&mut target2_config).await?;
    assert!(
        target2_config.revision == revision + 1,
        "expected revision {} got {}",
        revision + 1,
        target2_config.revision
    );

    let event = next_event(&mut target2_events).await;
    assert!(event.pipeline_config.id == target2_id, "expected event for {} got {}", target2_id, event.pipeline_config.id);

    let list = store1.list().await?;
    assert!(list.len() == 2, "expected 2 records got {}", list.len());

    // Read & update again through the other replica, once its cache has
    // observed the update above.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut target2_config = loop {
        let fetched = store2.get(&target2_id).await?;
        if fetched.revision == target2_config.revision {
            break fetched;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for replica cache to catch up");
        tokio::time::sleep(Duration::from_millis(50)).await;
    };
    target2_config.set_state(PipelineConfigState::Pending);
    let revision = target2_config.revision;
    store1.update(&mut target2_config).await?;
    assert!(target2_config.revision > revision, "expected revision above {} got {}", revision, target2_config.revision);

    let event = next_event(&mut target2_events).await;
    assert!(event.pipeline_config.id == target2_id, "expected event for {} got {}", target2_id, event.pipeline_config.id);

    store1.close().await?;
    store2.close().await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_updates_admit_one_writer() -> Result<()> {
    let (store1, store2, _tmpdir) = new_stores().await?;

    let mut config = new_config("target-1", &[0xaa, 0xbb]);
    let id = config.id.clone();
    store1.create(&mut config).await?;

    // Two replicas read the record at the same version and race a write.
    let mut read1 = store1.get(&id).await?;
    let mut read2 = store2.get(&id).await?;

    read1.set_state(PipelineConfigState::Complete);
    store1.update(&mut read1).await?;

    read2.set_state(PipelineConfigState::Failed);
    let err = store2.update(&mut read2).await.unwrap_err();
    assert!(err.is_conflict(), "expected Conflict got {:?}", err);

    let current = store1.get(&id).await?;
    assert!(
        current.state() == PipelineConfigState::Complete,
        "expected the first writer to win, got {:?}",
        current.state()
    );
    Ok(())
}

#[tokio::test]
async fn create_rejects_preassigned_revision_and_version() -> Result<()> {
    let (store1, _store2, _tmpdir) = new_stores().await?;

    let mut config = new_config("target-1", &[]);
    config.revision = 3;
    let err = store1.create(&mut config).await.unwrap_err();
    assert!(err.is_invalid(), "expected Invalid got {:?}", err);

    let mut config = new_config("target-1", &[]);
    config.version = 3;
    let err = store1.create(&mut config).await.unwrap_err();
    assert!(err.is_invalid(), "expected Invalid got {:?}", err);

    let mut config = new_config("target-1", &[]);
    config.id = "".into();
    let err = store1.create(&mut config).await.unwrap_err();
    assert!(err.is_invalid(), "expected Invalid got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn create_twice_is_already_exists() -> Result<()> {
    let (store1, store2, _tmpdir) = new_stores().await?;

    let mut config = new_config("target-1", &[]);
    store1.create(&mut config).await?;

    let mut duplicate = new_config("target-1", &[]);
    let err = store2.create(&mut duplicate).await.unwrap_err();
    assert!(err.is_already_exists(), "expected AlreadyExists got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn update_status_does_not_bump_revision() -> Result<()> {
    let (store1, _store2, _tmpdir) = new_stores().await?;

    let mut config = new_config("target-1", &[]);
    store1.create(&mut config).await?;
    let revision = config.revision;

    config.set_state(PipelineConfigState::Complete);
    store1.update_status(&mut config).await?;
    assert!(config.revision == revision, "expected revision to stay {} got {}", revision, config.revision);
    assert!(config.state() == PipelineConfigState::Complete, "expected Complete got {:?}", config.state());
    Ok(())
}

#[tokio::test]
async fn watch_with_replay_emits_snapshot_before_live_events() -> Result<()> {
    let (store1, store2, _tmpdir) = new_stores().await?;

    let mut target1_config = new_config("target-1", &[]);
    let mut target2_config = new_config("target-2", &[]);
    store1.create(&mut target1_config).await?;
    store1.create(&mut target2_config).await?;

    // Let the second replica's cache observe both records.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if store2.get(&target1_config.id).await.is_ok() && store2.get(&target2_config.id).await.is_ok() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for replica cache warm-up");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let mut events = store2
        .watch(WatchOptions {
            pipeline_config_id: None,
            replay: true,
        })
        .await?;

    let first = next_event(&mut events).await;
    let second = next_event(&mut events).await;
    assert!(first.r#type == ConfigurationEventType::Replayed, "expected Replayed got {:?}", first.r#type);
    assert!(second.r#type == ConfigurationEventType::Replayed, "expected Replayed got {:?}", second.r#type);

    let mut target3_config = new_config("target-3", &[]);
    store1.create(&mut target3_config).await?;

    let live = next_event(&mut events).await;
    assert!(live.r#type != ConfigurationEventType::Replayed, "expected a live event got {:?}", live.r#type);
    assert!(
        live.pipeline_config.target_id == "target-3",
        "expected live event for target-3 got {}",
        live.pipeline_config.target_id
    );
    Ok(())
}
