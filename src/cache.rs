//! Mapping cache: remembers which field a label resolved to.
//!
//! The whole cache is one JSON map stored under [`CACHE_STORAGE_KEY`] in an
//! asynchronous key-value store. Store failures and corrupted blobs are logged
//! and never reach the caller. A corrupted blob reads as an empty cache; a
//! failed read turns writes into no-ops so nothing already stored is lost.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{default_cache_dir, EngineConfig};
use crate::FieldId;

/// The storage slot holding the serialized cache map.
pub const CACHE_STORAGE_KEY: &str = "formfill.mappingCache";

/// Persistence boundary for the mapping cache.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

// ── MemoryStore ──

/// In-memory store for tests and single-process use.
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        store.remove(key);
        Ok(())
    }
}

// ── FileStore ──

/// One file per key in a directory. Writes go to a temporary file that is
/// renamed over the target, so readers never see a partial blob.
pub struct FileStore {
    dir: PathBuf,
    write_seq: AtomicU64,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_seq: AtomicU64::new(0),
        }
    }

    /// A store in the default cache directory.
    pub fn new_default() -> Self {
        Self::new(default_cache_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        tokio::fs::write(&tmp, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(anyhow!("Failed to replace {:?}: {}", path, e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// ── MappingCache ──

/// A remembered label → field association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub field: FieldId,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

type CacheMap = HashMap<String, CacheEntry>;

/// Label → field cache over a [`KeyValueStore`].
///
/// Keys are the trimmed raw labels. Read-modify-write cycles are serialized
/// within one cache instance, so stores for different labels never drop each
/// other; for the same label the last write wins.
pub struct MappingCache {
    store: Arc<dyn KeyValueStore>,
    retention: Duration,
    cleanup_every: usize,
    stores: AtomicUsize,
    write_lock: Mutex<()>,
}

impl MappingCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            retention: Duration::days(config.cache_retention_days),
            cleanup_every: config.cleanup_every.max(1),
            stores: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// A cache over a fresh [`MemoryStore`] with default settings.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), &EngineConfig::default())
    }

    /// Records `label → field`, replacing any earlier entry, stamped now.
    pub async fn store(&self, label: &str, field: &str, confidence: f32) {
        self.store_at(label, field, confidence, Utc::now()).await;
    }

    /// Records an entry with an explicit timestamp.
    pub async fn store_at(&self, label: &str, field: &str, confidence: f32, timestamp: DateTime<Utc>) {
        let key = label.trim();
        if key.is_empty() || field.is_empty() {
            return;
        }

        let guard = self.write_lock.lock().await;
        let Some(mut map) = self.load().await else {
            warn!("Skipping cache store for {:?}: mapping cache unreadable", key);
            return;
        };
        map.insert(
            key.to_string(),
            CacheEntry {
                field: field.to_string(),
                confidence,
                timestamp,
            },
        );
        self.save(&map).await;
        drop(guard);

        let stores = self.stores.fetch_add(1, Ordering::Relaxed) + 1;
        if stores % self.cleanup_every == 0 {
            self.cleanup().await;
        }
    }

    /// The unexpired entry for `label`, if any.
    pub async fn get(&self, label: &str) -> Option<CacheEntry> {
        let key = label.trim();
        if key.is_empty() {
            return None;
        }
        let entry = self.load().await?.remove(key)?;
        if self.is_expired(&entry, Utc::now()) {
            debug!("Ignoring expired cache entry for {:?}", key);
            return None;
        }
        Some(entry)
    }

    /// Removes entries older than the retention window. Returns how many went.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now()).await
    }

    /// Same as [`cleanup`](Self::cleanup) with an explicit notion of "now".
    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let _guard = self.write_lock.lock().await;
        let Some(mut map) = self.load().await else {
            warn!("Skipping cache cleanup: mapping cache unreadable");
            return 0;
        };
        let before = map.len();
        map.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - map.len();
        if removed > 0 {
            self.save(&map).await;
            info!("Cache cleanup removed {} expired entries", removed);
        }
        removed
    }

    /// Drops the whole cache.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.remove(CACHE_STORAGE_KEY).await {
            warn!("Failed to clear mapping cache: {}", e);
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.load().await.map_or(0, |map| map.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.timestamp) > self.retention
    }

    /// The stored map, or `None` when the store could not be read.
    ///
    /// A missing or corrupted blob reads as an empty map; a read error must not,
    /// since saving over it would erase entries the store still holds.
    async fn load(&self) -> Option<CacheMap> {
        match self.store.get(CACHE_STORAGE_KEY).await {
            Ok(Some(blob)) => Some(serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!("Mapping cache is corrupted, starting empty: {}", e);
                CacheMap::new()
            })),
            Ok(None) => Some(CacheMap::new()),
            Err(e) => {
                warn!("Mapping cache unavailable: {}", e);
                None
            }
        }
    }

    async fn save(&self, map: &CacheMap) {
        let blob = match serde_json::to_string(map) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to serialize mapping cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(CACHE_STORAGE_KEY, &blob).await {
            warn!("Failed to write mapping cache: {}", e);
        }
    }
}
