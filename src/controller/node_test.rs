use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use super::node::{NodeReconciler, NodeWatcher, ROLE_NAME};
use super::{Reconciler, Watcher};
use crate::fixtures::{switch_object, MemoryTopoStore};
use crate::grpc::topo::{ControllerInfo, Object};
use crate::grpc::KIND_CONTROLLER;
use crate::topo::TopoStore;

const CONTROLLER_ID: &str = "p4rt:c1";

#[tokio::test]
async fn first_reconcile_registers_the_controller_entity() -> Result<()> {
    let topo = MemoryTopoStore::new();
    let reconciler = NodeReconciler::new(topo.clone(), CONTROLLER_ID.into());

    let result = reconciler.reconcile(CONTROLLER_ID.into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");

    let entity = topo.get(CONTROLLER_ID).await?;
    assert!(entity.kind_id() == KIND_CONTROLLER, "expected kind controller got {}", entity.kind_id());
    let info: ControllerInfo = entity.get_aspect()?;
    assert!(info.uri == CONTROLLER_ID, "expected URI {} got {}", CONTROLLER_ID, info.uri);
    let role = info.role.map(|role| role.name).unwrap_or_default();
    assert!(role == ROLE_NAME, "expected role {} got {}", ROLE_NAME, role);
    Ok(())
}

#[tokio::test]
async fn repeated_reconciles_leave_the_entity_untouched() -> Result<()> {
    let topo = MemoryTopoStore::new();
    let reconciler = NodeReconciler::new(topo.clone(), CONTROLLER_ID.into());

    reconciler.reconcile(CONTROLLER_ID.into()).await?;
    let revision = topo.get(CONTROLLER_ID).await?.revision;

    // The entity already exists; further ticks must not rewrite it.
    reconciler.reconcile(CONTROLLER_ID.into()).await?;
    let entity = topo.get(CONTROLLER_ID).await?;
    assert!(entity.revision == revision, "expected revision to stay {} got {}", revision, entity.revision);
    Ok(())
}

#[tokio::test]
async fn entity_registered_by_another_path_is_benign() -> Result<()> {
    let topo = MemoryTopoStore::new();
    topo.create(Object::new_entity(CONTROLLER_ID, KIND_CONTROLLER)).await?;
    let reconciler = NodeReconciler::new(topo.clone(), CONTROLLER_ID.into());

    let result = reconciler.reconcile(CONTROLLER_ID.into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");
    Ok(())
}

#[tokio::test]
async fn watcher_emits_at_startup_and_on_matching_events_only() -> Result<()> {
    let topo = MemoryTopoStore::new();
    let (shutdown_tx, _) = broadcast::channel(1);
    let (ch_tx, mut ch_rx) = mpsc::channel(10);
    let mut watcher = NodeWatcher {
        topo: topo.clone(),
        controller_id: CONTROLLER_ID.into(),
    };
    watcher.start(ch_tx, shutdown_tx.subscribe()).await?;

    let first = tokio::time::timeout(Duration::from_secs(5), ch_rx.recv())
        .await?
        .expect("watcher channel closed");
    assert!(first == CONTROLLER_ID, "expected startup emission of {} got {}", CONTROLLER_ID, first);

    // An unrelated switch event is filtered; the controller entity's own
    // event comes through next.
    topo.create(switch_object("sw1", 1, &[])).await?;
    topo.create(Object::new_entity(CONTROLLER_ID, KIND_CONTROLLER)).await?;
    let second = tokio::time::timeout(Duration::from_secs(5), ch_rx.recv())
        .await?
        .expect("watcher channel closed");
    assert!(second == CONTROLLER_ID, "expected emission of {} got {}", CONTROLLER_ID, second);
    Ok(())
}
