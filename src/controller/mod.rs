//! A generic work-queue reconciler framework.
//!
//! A controller hosts a set of watchers feeding opaque IDs into a
//! deduplicating queue, and a reconciler invoked serially per ID and in
//! parallel across distinct IDs. Failed reconciles retry with exponential
//! backoff; reconcilers may also ask to be requeued.

mod connection;
mod mastership;
#[cfg(test)]
mod mastership_test;
mod node;
#[cfg(test)]
mod node_test;
mod pipeline_config;
mod pipeliner;
#[cfg(test)]
mod pipeliner_test;
mod watchers;

pub use connection::new_connection_controller;
pub use mastership::new_mastership_controller;
pub use node::new_node_controller;
pub use pipeline_config::new_pipeline_config_controller;
pub use pipeliner::new_pipeliner_controller;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::AppResult;

/// Capacity of the shared ID queue and of each watcher sink.
const QUEUE_BUFFER: usize = 100;
/// Capacity of each worker's inbox.
const WORKER_BUFFER: usize = 64;
/// Number of parallel reconcile workers per controller.
const DEFAULT_WORKERS: usize = 4;
/// Per-reconcile deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Initial retry delay after a failed reconcile.
const BACKOFF_BASE: Duration = Duration::from_millis(100);
/// Retry delay ceiling.
const BACKOFF_CAP: Duration = Duration::from_secs(60);
/// Rate-limit delay applied to explicit requeues.
const REQUEUE_DELAY: Duration = Duration::from_millis(100);

/// The bounds required of a reconciliation ID.
pub trait ControllerId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> ControllerId for T {}

/// The outcome of a successful reconcile.
#[derive(Debug)]
pub struct Reconciliation<I> {
    /// Re-enqueue the given ID for another pass.
    pub requeue: Option<I>,
    /// Re-enqueue this ID after the given delay.
    pub requeue_after: Option<Duration>,
}

impl<I> Reconciliation<I> {
    /// The reconcile is complete; nothing further to do.
    pub fn done() -> Self {
        Self {
            requeue: None,
            requeue_after: None,
        }
    }

    /// Re-enqueue the given ID for another pass.
    pub fn requeue(id: I) -> Self {
        Self {
            requeue: Some(id),
            requeue_after: None,
        }
    }

    /// Re-enqueue this ID after the given delay.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: None,
            requeue_after: Some(delay),
        }
    }
}

/// A source of reconciliation IDs.
///
/// A watcher spawns its own forwarding task when started and winds it down
/// when the shutdown channel fires.
#[async_trait]
pub trait Watcher<I>: Send + 'static {
    async fn start(&mut self, ch: mpsc::Sender<I>, shutdown: broadcast::Receiver<()>) -> AppResult<()>;
}

/// The user-supplied reconciliation logic.
#[async_trait]
pub trait Reconciler<I>: Send + Sync + 'static {
    async fn reconcile(&self, id: I) -> AppResult<Reconciliation<I>>;
}

/// A controller: watchers, a deduplicating ID queue and reconcile workers.
pub struct Controller<I> {
    name: String,
    watchers: Vec<Box<dyn Watcher<I>>>,
    reconciler: Option<Arc<dyn Reconciler<I>>>,
    workers: usize,
    timeout: Duration,
}

struct WorkerDone<I> {
    id: I,
    requeue: Option<(I, Duration)>,
}

impl<I: ControllerId> Controller<I> {
    /// Create a new controller with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            watchers: Vec::new(),
            reconciler: None,
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a watcher as an ID source.
    pub fn watch<W: Watcher<I>>(mut self, watcher: W) -> Self {
        self.watchers.push(Box::new(watcher));
        self
    }

    /// Set the reconciler.
    pub fn reconcile<R: Reconciler<I>>(mut self, reconciler: R) -> Self {
        self.reconciler = Some(Arc::new(reconciler));
        self
    }

    pub fn spawn(self, shutdown_tx: broadcast::Sender<()>) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(shutdown_tx))
    }

    async fn run(mut self, shutdown_tx: broadcast::Sender<()>) -> Result<()> {
        let reconciler = self.reconciler.take().context("no reconciler registered on controller")?;

        let (id_tx, mut id_rx) = mpsc::channel::<I>(QUEUE_BUFFER);
        for watcher in self.watchers.iter_mut() {
            watcher.start(id_tx.clone(), shutdown_tx.subscribe()).await?;
        }

        let (done_tx, mut done_rx) = mpsc::channel::<WorkerDone<I>>(QUEUE_BUFFER);
        let mut worker_txs = Vec::with_capacity(self.workers);
        let mut worker_handles = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let (tx, rx) = mpsc::channel::<I>(WORKER_BUFFER);
            worker_txs.push(tx);
            worker_handles.push(tokio::spawn(Self::worker(
                self.name.clone(),
                reconciler.clone(),
                rx,
                done_tx.clone(),
                shutdown_tx.subscribe(),
                self.timeout,
            )));
        }
        drop(done_tx);

        tracing::info!(controller = %self.name, "controller started");
        let mut tracked: HashSet<I> = HashSet::new();
        let mut shutdown = shutdown_tx.subscribe();
        loop {
            tokio::select! {
                Some(id) = id_rx.recv() => {
                    // Coalesce: an ID already queued or in flight is a no-op.
                    if !tracked.insert(id.clone()) {
                        continue;
                    }
                    let worker = Self::partition(&id, self.workers);
                    match worker_txs[worker].try_send(id) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(id)) => {
                            tracked.remove(&id);
                            let id_tx = id_tx.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(REQUEUE_DELAY).await;
                                let _ = id_tx.send(id).await;
                            });
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
                Some(done) = done_rx.recv() => {
                    tracked.remove(&done.id);
                    if let Some((id, delay)) = done.requeue {
                        let id_tx = id_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = id_tx.send(id).await;
                        });
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        // Stop feeding the workers and let in-flight reconciles finish.
        drop(worker_txs);
        for handle in worker_handles {
            let _ = handle.await;
        }
        tracing::info!(controller = %self.name, "controller shutdown complete");
        Ok(())
    }

    async fn worker(
        name: String, reconciler: Arc<dyn Reconciler<I>>, mut rx: mpsc::Receiver<I>, done_tx: mpsc::Sender<WorkerDone<I>>,
        mut shutdown: broadcast::Receiver<()>, timeout: Duration,
    ) {
        while let Some(id) = rx.recv().await {
            let mut backoff = BACKOFF_BASE;
            let outcome = loop {
                match tokio::time::timeout(timeout, reconciler.reconcile(id.clone())).await {
                    Ok(Ok(result)) => break Some(result),
                    Ok(Err(err)) => {
                        tracing::warn!(controller = %name, id = ?id, error = %err, "error reconciling, retrying")
                    }
                    Err(_elapsed) => {
                        tracing::warn!(controller = %name, id = ?id, "reconcile deadline exceeded, retrying")
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown.recv() => break None,
                }
                backoff = std::cmp::min(backoff * 2, BACKOFF_CAP);
            };
            let requeue = outcome.and_then(|result| {
                if let Some(requeue_id) = result.requeue {
                    Some((requeue_id, REQUEUE_DELAY))
                } else {
                    result.requeue_after.map(|delay| (id.clone(), delay))
                }
            });
            if done_tx.send(WorkerDone { id, requeue }).await.is_err() {
                return;
            }
        }
    }

    fn partition(id: &I, workers: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() as usize) % workers
    }
}
