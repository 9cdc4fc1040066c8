//! The replicated key/value map primitive backing the durable stores.
//!
//! The contract mirrors the external replicated map service: versioned
//! entries, preconditioned puts and a watch stream with optional replay.
//! `SledMap` is the sled-backed realization used by a standalone deployment
//! and by tests; a clustered deployment substitutes a distributed
//! implementation of the same trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::database::{Database, Tree};
use crate::error::{AppError, AppResult};
use crate::utils;

/// Capacity of a watch channel handed to a map subscriber.
const WATCH_BUFFER: usize = 1024;
/// How often the watch bridge checks for a dropped subscriber.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A precondition applied to a put.
#[derive(Clone, Copy, Debug)]
pub enum Precondition {
    /// The key must not exist yet.
    IfAbsent,
    /// The key's current revision must equal the given value.
    IfVersion(u64),
}

/// A versioned map entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Vec<u8>,
    /// Monotonic write-token of the key, starting at 1.
    pub revision: u64,
}

/// The map primitive contract.
#[async_trait]
pub trait Map: Send + Sync + 'static {
    /// Write a value under the given precondition, returning the new entry.
    async fn put(&self, key: &str, value: Vec<u8>, precondition: Precondition) -> AppResult<Entry>;
    /// Get the entry for a key.
    async fn get(&self, key: &str) -> AppResult<Entry>;
    /// Enumerate all entries.
    async fn entries(&self) -> AppResult<Vec<Entry>>;
    /// Stream entry writes; with `replay`, current entries are emitted first.
    async fn watch(&self, replay: bool) -> AppResult<mpsc::Receiver<Entry>>;
    /// Flush and release the map.
    async fn close(&self) -> AppResult<()>;
}

/// A sled-backed map.
///
/// Values are stored as an 8-byte big-endian per-key revision followed by the
/// payload; preconditions are enforced with compare-and-swap on the raw bytes.
pub struct SledMap {
    tree: Tree,
}

impl SledMap {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    fn encode_entry(revision: u64, value: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + value.len());
        buf.extend_from_slice(&utils::encode_u64(revision));
        buf.extend_from_slice(value);
        buf
    }

    fn decode_entry(key: &[u8], raw: &[u8]) -> AppResult<Entry> {
        if raw.len() < 8 {
            return Err(AppError::Internal("map entry shorter than its revision header".into()));
        }
        let revision = utils::decode_u64(&raw[..8]).map_err(|err| AppError::Internal(err.to_string()))?;
        Ok(Entry {
            key: String::from_utf8_lossy(key).to_string(),
            value: raw[8..].to_vec(),
            revision,
        })
    }
}

#[async_trait]
impl Map for SledMap {
    async fn put(&self, key: &str, value: Vec<u8>, precondition: Precondition) -> AppResult<Entry> {
        let (tree, key) = (self.tree.clone(), key.to_string());
        Database::spawn_blocking(move || -> AppResult<Entry> {
            match precondition {
                Precondition::IfAbsent => {
                    let new = Self::encode_entry(1, &value);
                    let res = tree
                        .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(new.as_slice()))
                        .map_err(|err| AppError::Unavailable(err.to_string()))?;
                    if res.is_err() {
                        return Err(AppError::AlreadyExists(format!("key '{}' already exists", key)));
                    }
                    Ok(Entry {
                        key,
                        value,
                        revision: 1,
                    })
                }
                Precondition::IfVersion(version) => {
                    let current = tree
                        .get(key.as_bytes())
                        .map_err(|err| AppError::Unavailable(err.to_string()))?
                        .ok_or_else(|| AppError::Conflict(format!("key '{}' does not exist", key)))?;
                    let entry = Self::decode_entry(key.as_bytes(), &current)?;
                    if entry.revision != version {
                        return Err(AppError::Conflict(format!(
                            "key '{}' is at revision {}, expected {}",
                            key, entry.revision, version
                        )));
                    }
                    let new = Self::encode_entry(version + 1, &value);
                    let res = tree
                        .compare_and_swap(key.as_bytes(), Some(&current), Some(new.as_slice()))
                        .map_err(|err| AppError::Unavailable(err.to_string()))?;
                    if res.is_err() {
                        return Err(AppError::Conflict(format!("key '{}' was concurrently updated", key)));
                    }
                    Ok(Entry {
                        key,
                        value,
                        revision: version + 1,
                    })
                }
            }
        })
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
    }

    async fn get(&self, key: &str) -> AppResult<Entry> {
        let (tree, key) = (self.tree.clone(), key.to_string());
        Database::spawn_blocking(move || -> AppResult<Entry> {
            let raw = tree
                .get(key.as_bytes())
                .map_err(|err| AppError::Unavailable(err.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("key '{}' not found", key)))?;
            Self::decode_entry(key.as_bytes(), &raw)
        })
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
    }

    async fn entries(&self) -> AppResult<Vec<Entry>> {
        let tree = self.tree.clone();
        Database::spawn_blocking(move || -> AppResult<Vec<Entry>> {
            let mut entries = Vec::new();
            for kv in tree.iter() {
                let (key, raw) = kv.map_err(|err| AppError::Unavailable(err.to_string()))?;
                entries.push(Self::decode_entry(&key, &raw)?);
            }
            Ok(entries)
        })
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
    }

    async fn watch(&self, replay: bool) -> AppResult<mpsc::Receiver<Entry>> {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let tree = self.tree.clone();
        // Subscribe before snapshotting so no write is missed; an entry
        // observed by both paths is deduplicated downstream by revision.
        tokio::task::spawn_blocking(move || {
            let mut subscriber = tree.watch_prefix(vec![]);
            if replay {
                for kv in tree.iter() {
                    let (key, raw) = match kv {
                        Ok(kv) => kv,
                        Err(err) => {
                            tracing::error!(error = ?err, "error iterating map entries for watch replay");
                            return;
                        }
                    };
                    match Self::decode_entry(&key, &raw) {
                        Ok(entry) => {
                            if tx.blocking_send(entry).is_err() {
                                return;
                            }
                        }
                        Err(err) => tracing::error!(error = ?err, "error decoding map entry for watch replay"),
                    }
                }
            }
            loop {
                if tx.is_closed() {
                    return;
                }
                match subscriber.next_timeout(WATCH_POLL_INTERVAL) {
                    Ok(event) => {
                        if let sled::Event::Insert { key, value } = event {
                            match Self::decode_entry(&key, &value) {
                                Ok(entry) => {
                                    if tx.blocking_send(entry).is_err() {
                                        return;
                                    }
                                }
                                Err(err) => tracing::error!(error = ?err, "error decoding map entry from watch"),
                            }
                        }
                    }
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return,
                }
            }
        });
        Ok(rx)
    }

    async fn close(&self) -> AppResult<()> {
        self.tree.flush_async().await.map_err(|err| AppError::Unavailable(err.to_string()))?;
        Ok(())
    }
}
