use std::sync::Arc;

use anyhow::Result;

use super::mastership::MastershipReconciler;
use super::Reconciler;
use crate::config::Config;
use crate::error::AppError;
use crate::fixtures::{arbitration_response, switch_object, FakeSession, MemoryTopoStore};
use crate::grpc::p4rt::Code;
use crate::grpc::topo::{ControllerInfo, ControllerRole, Object, P4RtMastershipState};
use crate::grpc::{KIND_CONTROLLER, KIND_CONTROLS};
use crate::p4rt::ConnManager;
use crate::topo::TopoStore;

const CONTROLLER_ID: &str = "p4rt:c1";

struct Harness {
    topo: Arc<MemoryTopoStore>,
    session: Arc<FakeSession>,
    reconciler: MastershipReconciler,
    _tmpdir: tempfile::TempDir,
}

/// Topology with switch `sw1` (device 1), controller `c1` and relation
/// `r1 = (c1 -> sw1)`, plus a scripted session registered under `r1`.
async fn harness() -> Result<Harness> {
    let (config, tmpdir) = Config::new_test()?;
    let topo = MemoryTopoStore::new();

    let mut controller = Object::new_entity(CONTROLLER_ID, KIND_CONTROLLER);
    controller.set_aspect(&ControllerInfo {
        uri: CONTROLLER_ID.into(),
        role: Some(ControllerRole { name: "p4rt".into() }),
    })?;
    topo.create(controller).await?;
    topo.create(switch_object("sw1", 1, &[("basic", "1.0.0", "v1model")])).await?;
    topo.create(Object::new_relation("r1", KIND_CONTROLS, CONTROLLER_ID, "sw1")).await?;

    let conns = ConnManager::new(config, topo.clone());
    let session = FakeSession::new("r1", "sw1");
    conns.insert(session.clone()).await;

    let reconciler = MastershipReconciler::new(topo.clone(), conns, CONTROLLER_ID.into());
    Ok(Harness {
        topo,
        session,
        reconciler,
        _tmpdir: tmpdir,
    })
}

#[tokio::test]
async fn election_from_cold_records_mastership() -> Result<()> {
    let harness = harness().await?;
    harness.session.push_arbitration_response(Ok(Some(arbitration_response(Code::Ok, 1))));

    let result = harness.reconciler.reconcile("sw1".into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");

    let sent = harness.session.sent_arbitrations.lock().unwrap().clone();
    assert!(sent == vec![(1, 1, "p4rt".to_string())], "unexpected arbitration requests {:?}", sent);

    let switch = harness.topo.get("sw1").await?;
    let mastership: P4RtMastershipState = switch.get_aspect()?;
    assert!(mastership.node_id == "r1", "expected node r1 got {}", mastership.node_id);
    assert!(mastership.term == 1, "expected term 1 got {}", mastership.term);
    Ok(())
}

#[tokio::test]
async fn losing_an_election_leaves_state_untouched() -> Result<()> {
    let harness = harness().await?;
    harness
        .session
        .push_arbitration_response(Ok(Some(arbitration_response(Code::AlreadyExists, 1))));

    harness.reconciler.reconcile("sw1".into()).await?;

    let switch = harness.topo.get("sw1").await?;
    let err = switch.get_aspect::<P4RtMastershipState>().unwrap_err();
    assert!(err.is_not_found(), "expected mastership state to stay unset, got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn no_primary_yet_requeues_for_retry() -> Result<()> {
    let harness = harness().await?;
    harness
        .session
        .push_arbitration_response(Ok(Some(arbitration_response(Code::NotFound, 0))));

    let result = harness.reconciler.reconcile("sw1".into()).await?;
    assert!(result.requeue.as_deref() == Some("sw1"), "expected a requeue of sw1, got {:?}", result.requeue);
    Ok(())
}

#[tokio::test]
async fn stream_eof_mid_election_is_a_noop() -> Result<()> {
    let harness = harness().await?;
    harness.session.push_arbitration_response(Ok(None));

    let result = harness.reconciler.reconcile("sw1".into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");

    let switch = harness.topo.get("sw1").await?;
    assert!(switch.get_aspect::<P4RtMastershipState>().is_err(), "expected mastership state to stay unset");
    Ok(())
}

#[tokio::test]
async fn used_election_id_surfaces_the_error() -> Result<()> {
    let harness = harness().await?;
    harness
        .session
        .push_arbitration_response(Err(AppError::Invalid("election ID already in use".into())));

    let err = harness.reconciler.reconcile("sw1".into()).await.unwrap_err();
    assert!(err.is_invalid(), "expected Invalid got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn primary_resignation_clears_the_mastership_node() -> Result<()> {
    let harness = harness().await?;
    harness.session.push_arbitration_response(Ok(Some(arbitration_response(Code::Ok, 1))));
    harness.reconciler.reconcile("sw1".into()).await?;

    // The relation disappears while the aspect still names it.
    let relation = harness.topo.get("r1").await?;
    harness.topo.delete("r1", relation.revision).await?;
    harness.reconciler.reconcile("sw1".into()).await?;

    let switch = harness.topo.get("sw1").await?;
    let mastership: P4RtMastershipState = switch.get_aspect()?;
    assert!(mastership.node_id.is_empty(), "expected node to be cleared, got {}", mastership.node_id);
    assert!(mastership.term == 1, "expected term to survive the resignation, got {}", mastership.term);
    Ok(())
}

#[tokio::test]
async fn successive_elections_use_monotonic_terms() -> Result<()> {
    let harness = harness().await?;
    harness.session.push_arbitration_response(Ok(Some(arbitration_response(Code::Ok, 1))));
    harness.reconciler.reconcile("sw1".into()).await?;

    // The switch reconnects under a fresh relation; the next attempt must
    // claim term + 1.
    let relation = harness.topo.get("r1").await?;
    harness.topo.delete("r1", relation.revision).await?;
    harness.topo.create(Object::new_relation("r2", KIND_CONTROLS, CONTROLLER_ID, "sw1")).await?;

    harness.session.push_arbitration_response(Ok(Some(arbitration_response(Code::Ok, 2))));
    harness.reconciler.reconcile("sw1".into()).await?;

    let sent = harness.session.sent_arbitrations.lock().unwrap().clone();
    assert!(sent.len() == 2, "expected 2 arbitration requests got {}", sent.len());
    assert!(sent[1].1 == 2, "expected second election ID 2 got {}", sent[1].1);

    let switch = harness.topo.get("sw1").await?;
    let mastership: P4RtMastershipState = switch.get_aspect()?;
    assert!(mastership.node_id == "r2", "expected node r2 got {}", mastership.node_id);
    assert!(mastership.term == 2, "expected term 2 got {}", mastership.term);
    Ok(())
}

#[tokio::test]
async fn missing_switch_is_a_noop() -> Result<()> {
    let harness = harness().await?;
    let result = harness.reconciler.reconcile("sw-unknown".into()).await?;
    assert!(result.requeue.is_none(), "expected no requeue");
    Ok(())
}
