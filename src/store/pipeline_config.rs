//! The durable, replicated pipeline-config store.
//!
//! Records live in the backing key/value map; a write-through cache is kept
//! current by a background subscription to the map's watch stream, and cache
//! changes fan out to registered watchers. Optimistic concurrency rides on
//! the map's per-key write revision, surfaced as the record `version`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::kv::{self, Entry, Precondition};
use crate::models::p4rt::{ConfigurationEvent, ConfigurationEventType, PipelineConfig, PipelineConfigId};
use crate::utils;

/// Capacity of the internal event channel between cache and fan-out.
const EVENT_BUFFER: usize = 1000;
/// Capacity of each watcher's buffer; a watcher which lets it overflow is dropped.
const WATCHER_BUFFER: usize = 64;

/// Options for a watch call.
#[derive(Clone, Debug, Default)]
pub struct WatchOptions {
    /// Restrict delivered events to the given record ID.
    pub pipeline_config_id: Option<PipelineConfigId>,
    /// Emit the cached snapshot as replayed events, strictly before any live
    /// event.
    pub replay: bool,
}

/// The pipeline-config store.
#[derive(Clone)]
pub struct PipelineConfigStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    map: Arc<dyn kv::Map>,
    cache: RwLock<HashMap<String, Entry>>,
    watchers: RwLock<HashMap<Uuid, mpsc::Sender<ConfigurationEvent>>>,
    events_tx: mpsc::Sender<ConfigurationEvent>,
}

impl PipelineConfigStore {
    /// Open the store over the given map primitive.
    pub async fn new(map: Arc<dyn kv::Map>) -> AppResult<Self> {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let inner = Arc::new(StoreInner {
            map,
            cache: RwLock::new(HashMap::new()),
            watchers: RwLock::new(HashMap::new()),
            events_tx,
        });

        // Keep the cache current from the map's own watch stream, replaying
        // current entries so a restarted replica warms up before serving.
        let mut map_rx = inner.map.watch(true).await?;
        let cache_inner = inner.clone();
        tokio::spawn(async move {
            while let Some(entry) = map_rx.recv().await {
                if let Some(event) = cache_inner.update_cache(entry) {
                    let _ = cache_inner.events_tx.send(event).await;
                }
            }
        });

        // Fan cache events out to every registered watcher.
        let fanout_inner = inner.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                fanout_inner.broadcast(event);
            }
        });

        Ok(Self { inner })
    }

    /// Get the record with the given ID.
    ///
    /// Served from the cache when present; otherwise fetched from the backing
    /// map, which also refreshes the cache.
    pub async fn get(&self, id: &str) -> AppResult<PipelineConfig> {
        {
            let cache = self.inner.cache.read().expect("store cache lock poisoned");
            if let Some(entry) = cache.get(id) {
                return decode_pipeline_config(entry);
            }
        }

        let entry = self.inner.map.get(id).await?;
        let config = decode_pipeline_config(&entry)?;
        if let Some(event) = self.inner.update_cache(entry) {
            let _ = self.inner.events_tx.send(event).await;
        }
        Ok(config)
    }

    /// Create a new record.
    ///
    /// The record must carry no revision or version yet; on success it is
    /// updated in place with the assigned revision, version and timestamps.
    pub async fn create(&self, pipeline_config: &mut PipelineConfig) -> AppResult<()> {
        if pipeline_config.id.is_empty() {
            return Err(AppError::Invalid("no pipeline config ID specified".into()));
        }
        if pipeline_config.target_id.is_empty() {
            return Err(AppError::Invalid("no target ID specified".into()));
        }
        if pipeline_config.revision != 0 {
            return Err(AppError::Invalid("cannot create pipeline config with revision".into()));
        }
        if pipeline_config.version != 0 {
            return Err(AppError::Invalid("cannot create pipeline config with version".into()));
        }
        pipeline_config.revision = 1;
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        pipeline_config.created = now;
        pipeline_config.updated = now;

        let bytes = utils::encode_model(pipeline_config).map_err(|err| AppError::Invalid(format!("pipeline config encoding failed: {}", err)))?;
        let entry = self.inner.map.put(&pipeline_config.id, bytes, Precondition::IfAbsent).await?;

        *pipeline_config = decode_pipeline_config(&entry)?;
        if let Some(event) = self.inner.update_cache(entry) {
            let _ = self.inner.events_tx.send(event).await;
        }
        Ok(())
    }

    /// Update an existing record, bumping its logical revision.
    pub async fn update(&self, pipeline_config: &mut PipelineConfig) -> AppResult<()> {
        self.write(pipeline_config, true).await
    }

    /// Update an existing record's status without bumping its revision.
    pub async fn update_status(&self, pipeline_config: &mut PipelineConfig) -> AppResult<()> {
        self.write(pipeline_config, false).await
    }

    async fn write(&self, pipeline_config: &mut PipelineConfig, bump_revision: bool) -> AppResult<()> {
        if pipeline_config.id.is_empty() {
            return Err(AppError::Invalid("no pipeline config ID specified".into()));
        }
        if pipeline_config.target_id.is_empty() {
            return Err(AppError::Invalid("no target ID specified".into()));
        }
        if pipeline_config.revision == 0 {
            return Err(AppError::Invalid("pipeline config must contain a revision on update".into()));
        }
        if pipeline_config.version == 0 {
            return Err(AppError::Invalid("pipeline config must contain a version on update".into()));
        }
        if bump_revision {
            pipeline_config.revision += 1;
        }
        pipeline_config.updated = time::OffsetDateTime::now_utc().unix_timestamp();

        let bytes = utils::encode_model(pipeline_config).map_err(|err| AppError::Invalid(format!("pipeline config encoding failed: {}", err)))?;
        // The record version is the optimistic lock: a concurrent writer has
        // already advanced the entry past it and this put returns Conflict.
        let entry = self
            .inner
            .map
            .put(&pipeline_config.id, bytes, Precondition::IfVersion(pipeline_config.version))
            .await?;

        *pipeline_config = decode_pipeline_config(&entry)?;
        if let Some(event) = self.inner.update_cache(entry) {
            let _ = self.inner.events_tx.send(event).await;
        }
        Ok(())
    }

    /// Enumerate all records.
    pub async fn list(&self) -> AppResult<Vec<PipelineConfig>> {
        let entries = self.inner.map.entries().await?;
        let mut pipeline_configs = Vec::with_capacity(entries.len());
        for entry in &entries {
            match decode_pipeline_config(entry) {
                Ok(config) => pipeline_configs.push(config),
                Err(err) => tracing::error!(error = ?err, key = %entry.key, "error decoding pipeline config"),
            }
        }
        Ok(pipeline_configs)
    }

    /// Register a watcher, returning its event channel.
    ///
    /// The watcher is deregistered when the receiver is dropped, or forcibly
    /// when its buffer overflows.
    pub async fn watch(&self, options: WatchOptions) -> AppResult<mpsc::Receiver<ConfigurationEvent>> {
        let (watch_tx, mut watch_rx) = mpsc::channel(WATCHER_BUFFER);
        let watcher_id = Uuid::new_v4();
        self.inner
            .watchers
            .write()
            .expect("store watchers lock poisoned")
            .insert(watcher_id, watch_tx);

        // Snapshot replay events under the read lock, before any live event
        // can be observed through the freshly registered channel.
        let mut replay = Vec::new();
        if options.replay {
            let cache = self.inner.cache.read().expect("store cache lock poisoned");
            for entry in cache.values() {
                if let Some(id) = &options.pipeline_config_id {
                    if &entry.key != id {
                        continue;
                    }
                }
                match decode_pipeline_config(entry) {
                    Ok(config) => replay.push(ConfigurationEvent {
                        r#type: ConfigurationEventType::Replayed,
                        pipeline_config: config,
                    }),
                    Err(err) => tracing::error!(error = ?err, key = %entry.key, "error decoding pipeline config for replay"),
                }
            }
        }

        let (out_tx, out_rx) = mpsc::channel(WATCHER_BUFFER);
        let inner = self.inner.clone();
        tokio::spawn(async move {
            for event in replay {
                if out_tx.send(event).await.is_err() {
                    inner.unregister(watcher_id);
                    return;
                }
            }
            while let Some(event) = watch_rx.recv().await {
                if let Some(id) = &options.pipeline_config_id {
                    if &event.pipeline_config.id != id {
                        continue;
                    }
                }
                if out_tx.send(event).await.is_err() {
                    break;
                }
            }
            inner.unregister(watcher_id);
        });
        Ok(out_rx)
    }

    /// Flush and release the backing map.
    pub async fn close(&self) -> AppResult<()> {
        self.inner.map.close().await
    }
}

impl StoreInner {
    /// Apply an observed entry to the cache, returning the event to publish
    /// when the entry is news.
    fn update_cache(&self, new_entry: Entry) -> Option<ConfigurationEvent> {
        // Double-checked lock: compare under the read lock first, then
        // re-validate after upgrading to the write lock.
        {
            let cache = self.cache.read().expect("store cache lock poisoned");
            if let Some(entry) = cache.get(&new_entry.key) {
                if entry.revision >= new_entry.revision {
                    return None;
                }
            }
        }

        let mut cache = self.cache.write().expect("store cache lock poisoned");
        let event_type = match cache.get(&new_entry.key) {
            Some(entry) if entry.revision >= new_entry.revision => return None,
            Some(_) => ConfigurationEventType::Updated,
            None => ConfigurationEventType::Created,
        };
        let decoded = decode_pipeline_config(&new_entry);
        cache.insert(new_entry.key.clone(), new_entry);
        match decoded {
            Ok(pipeline_config) => Some(ConfigurationEvent {
                r#type: event_type,
                pipeline_config,
            }),
            Err(err) => {
                tracing::error!(error = ?err, "error decoding pipeline config from map watch");
                None
            }
        }
    }

    /// Forward an event to every registered watcher, dropping any watcher
    /// whose buffer is full so a slow consumer can never stall the fan-out.
    fn broadcast(&self, event: ConfigurationEvent) {
        let mut overflowed = Vec::new();
        {
            let watchers = self.watchers.read().expect("store watchers lock poisoned");
            for (id, watcher) in watchers.iter() {
                if let Err(mpsc::error::TrySendError::Full(_)) = watcher.try_send(event.clone()) {
                    tracing::warn!(watcher = %id, "pipeline config watcher too slow, dropping");
                    overflowed.push(*id);
                }
            }
        }
        if !overflowed.is_empty() {
            let mut watchers = self.watchers.write().expect("store watchers lock poisoned");
            for id in overflowed {
                watchers.remove(&id);
            }
        }
    }

    fn unregister(&self, watcher_id: Uuid) {
        self.watchers.write().expect("store watchers lock poisoned").remove(&watcher_id);
    }
}

/// Decode a map entry into a record, stamping the entry-derived fields.
fn decode_pipeline_config(entry: &Entry) -> AppResult<PipelineConfig> {
    let mut pipeline_config: PipelineConfig =
        utils::decode_model(&entry.value).map_err(|err| AppError::Invalid(format!("pipeline config decoding failed: {}", err)))?;
    pipeline_config.id = entry.key.clone();
    pipeline_config.version = entry.revision;
    Ok(pipeline_config)
}
