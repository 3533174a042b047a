//! Resource Cache - bounded in-memory byte store
//!
//! # Design
//!
//! - One map from source URL to [`CacheEntry`], plus an ordered index on
//!   `(stored_at, seq)` so the globally oldest entry is found in O(log n)
//! - Age is checked lazily on read; expired entries are evicted by `get`
//! - The size budget is soft: a single entry larger than the budget is
//!   still stored once every other entry has been evicted

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::entry::{CacheEntry, ReleaseCounter, ResourceHandle};
use super::{DEFAULT_MAX_AGE, DEFAULT_MAX_CACHE_SIZE};
use crate::clock::{self, SharedClock};
use crate::domain::{CacheEvictionListener, ResourceFetcher};
use crate::error::Result;

/// Resource cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Total byte budget
    pub max_cache_size: u64,
    /// Maximum age before an entry is treated as absent
    #[serde(with = "crate::config::duration_ms", rename = "maxAgeMs")]
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    order: BTreeMap<(std::time::Instant, u64), String>,
    current_size: u64,
    next_seq: u64,
}

impl CacheInner {
    fn take(&mut self, url: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(url)?;
        self.order.remove(&entry.order_key());
        self.current_size -= entry.size();
        Some(entry)
    }

    fn take_oldest(&mut self) -> Option<CacheEntry> {
        let (_, url) = self.order.pop_first()?;
        let entry = self.entries.remove(&url)?;
        self.current_size -= entry.size();
        Some(entry)
    }
}

/// Bounded, age-limited cache of fetched resource bytes
pub struct ResourceCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
    clock: SharedClock,
    releases: ReleaseCounter,
    listeners: RwLock<Vec<Arc<dyn CacheEvictionListener>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl ResourceCache {
    /// Create a cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_clock(config, clock::system())
    }

    /// Create a cache reading time from `clock`
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            config,
            clock,
            releases: ReleaseCounter::new(),
            listeners: RwLock::new(Vec::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Look up `url`. Expired entries are evicted and reported absent.
    pub fn get(&self, url: &str) -> Option<Bytes> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(url) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(entry) => entry.is_expired(now, self.config.max_age),
        };

        if expired {
            let taken = inner.take(url);
            drop(inner);
            if let Some(entry) = taken {
                debug!(url, age = ?entry.age(now), "Cache entry expired");
                entry.release();
                self.notify_evicted(&[url.to_string()]);
            }
            self.expirations.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        inner.entries.get(url).map(CacheEntry::data)
    }

    /// Store `data` under `url` and return a reference to the cached bytes.
    pub fn put(&self, url: &str, data: Bytes) -> Bytes {
        let size = data.len() as u64;
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if let Some(old) = inner.take(url) {
            old.release();
        }

        let mut evicted = Vec::new();
        while inner.current_size + size > self.config.max_cache_size {
            match inner.take_oldest() {
                Some(victim) => {
                    debug!(
                        url = victim.source_url(),
                        size = victim.size(),
                        "Evicting oldest cache entry"
                    );
                    evicted.push(victim.source_url().to_string());
                    victim.release();
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }

        if size > self.config.max_cache_size {
            debug!(url, size, max = self.config.max_cache_size, "Storing oversized entry");
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let reference = data.clone();
        let entry = CacheEntry::new(
            url.to_string(),
            ResourceHandle::new(data, self.releases.clone()),
            now,
            seq,
        );
        inner.order.insert(entry.order_key(), url.to_string());
        inner.entries.insert(url.to_string(), entry);
        inner.current_size += size;
        drop(inner);

        self.notify_evicted(&evicted);
        reference
    }

    /// Remove `url`, releasing its handle. No-op when absent.
    pub fn remove(&self, url: &str) -> bool {
        let removed = self.inner.lock().take(url);
        match removed {
            Some(entry) => {
                entry.release();
                self.notify_evicted(&[url.to_string()]);
                true
            }
            None => false,
        }
    }

    /// Release every handle.
    pub fn clear(&self) {
        let drained: Vec<CacheEntry> = {
            let mut inner = self.inner.lock();
            inner.order.clear();
            inner.current_size = 0;
            inner.entries.drain().map(|(_, entry)| entry).collect()
        };
        let urls: Vec<String> = drained.iter().map(|e| e.source_url().to_string()).collect();
        drained.into_iter().for_each(CacheEntry::release);
        debug!(released = urls.len(), "Cache cleared");
        self.notify_evicted(&urls);
    }

    /// Report every future drop of an entry to `listener`
    pub fn subscribe(&self, listener: Arc<dyn CacheEvictionListener>) {
        self.listeners.write().push(listener);
    }

    fn notify_evicted(&self, urls: &[String]) {
        if urls.is_empty() {
            return;
        }
        let listeners = self.listeners.read();
        for url in urls {
            for listener in listeners.iter() {
                listener.evicted(url);
            }
        }
    }

    /// Fetch `url` and store the result. Fetch errors are returned to the caller.
    #[instrument(skip(self, fetcher))]
    pub async fn cache_resource(&self, fetcher: &dyn ResourceFetcher, url: &str) -> Result<Bytes> {
        let data = fetcher.fetch(url).await?;
        Ok(self.put(url, data))
    }

    /// Fetch a batch concurrently. Failed URLs are logged and omitted.
    #[instrument(skip(self, fetcher, urls), fields(count = urls.len()))]
    pub async fn preload_many(
        &self,
        fetcher: &dyn ResourceFetcher,
        urls: &[String],
    ) -> HashMap<String, Bytes> {
        let loads = urls.iter().map(|url| async move {
            if let Some(data) = self.get(url) {
                return (url.clone(), Ok(data));
            }
            (url.clone(), self.cache_resource(fetcher, url).await)
        });

        let mut loaded = HashMap::with_capacity(urls.len());
        for (url, result) in join_all(loads).await {
            match result {
                Ok(data) => {
                    loaded.insert(url, data);
                }
                Err(e) => warn!("Failed to preload {}: {}", url, e),
            }
        }
        loaded
    }

    /// Check if cache holds a live or not-yet-checked entry for `url`
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().entries.contains_key(url)
    }

    /// Total bytes held
    pub fn size(&self) -> u64 {
        self.inner.lock().current_size
    }

    /// Byte budget
    pub fn max_size(&self) -> u64 {
        self.config.max_cache_size
    }

    /// Maximum entry age
    pub fn max_age(&self) -> Duration {
        self.config.max_age
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// URLs currently held, oldest first
    pub fn urls(&self) -> Vec<String> {
        self.inner.lock().order.values().cloned().collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let (entries, size_bytes) = {
            let inner = self.inner.lock();
            (inner.entries.len(), inner.current_size)
        };
        CacheStats {
            entries,
            size_bytes,
            max_size_bytes: self.config.max_cache_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            releases: self.releases.get(),
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Resource cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries
    pub entries: usize,
    /// Current size in bytes
    pub size_bytes: u64,
    /// Budget in bytes
    pub max_size_bytes: u64,
    /// Lookups that returned data
    pub hits: u64,
    /// Lookups that returned nothing (includes expirations)
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed for age
    pub expirations: u64,
    /// Handles released
    pub releases: u64,
}

// =============================================================================
// Tests
// =============================================================================
