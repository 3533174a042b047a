//! Cache Entry Types
//!
//! A [`ResourceHandle`] owns the backing allocation of one cached resource.
//! Dropping the handle is the release; the shared [`ReleaseCounter`] makes
//! the number of releases observable so leaks show up in stats and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

/// Counts handle releases across a cache's lifetime.
#[derive(Debug, Default, Clone)]
pub struct ReleaseCounter(Arc<AtomicU64>);

impl ReleaseCounter {
    /// New counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases observed so far.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Exclusive ownership token for cached bytes.
///
/// Not `Clone`: exactly one handle exists per entry, so the release in
/// `Drop` runs exactly once.
pub struct ResourceHandle {
    data: Bytes,
    releases: ReleaseCounter,
}

impl ResourceHandle {
    /// Wrap bytes, reporting the eventual release to `releases`.
    pub fn new(data: Bytes, releases: ReleaseCounter) -> Self {
        Self { data, releases }
    }

    /// A cheap reference to the bytes (zero-copy).
    #[inline]
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }

    /// Size of the backing allocation.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for zero-length resources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Release explicitly. Equivalent to dropping.
    pub fn release(self) {
        drop(self)
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.releases.bump();
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("len", &self.data.len())
            .finish()
    }
}

/// One cached resource.
#[derive(Debug)]
pub struct CacheEntry {
    /// Cache key
    source_url: String,
    /// Owned bytes
    handle: ResourceHandle,
    /// Size in bytes
    size_bytes: u64,
    /// When the entry was stored
    stored_at: Instant,
    /// Insertion sequence, breaks `stored_at` ties
    seq: u64,
}

impl CacheEntry {
    pub(crate) fn new(source_url: String, handle: ResourceHandle, stored_at: Instant, seq: u64) -> Self {
        let size_bytes = handle.len() as u64;
        Self {
            source_url,
            handle,
            size_bytes,
            stored_at,
            seq,
        }
    }

    /// Source URL this entry is keyed by
    #[inline]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Reference to the cached bytes
    #[inline]
    pub fn data(&self) -> Bytes {
        self.handle.data()
    }

    /// Size in bytes
    #[inline]
    pub fn size(&self) -> u64 {
        self.size_bytes
    }

    /// Storage instant
    #[inline]
    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    pub(crate) fn order_key(&self) -> (Instant, u64) {
        (self.stored_at, self.seq)
    }

    /// Age relative to `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// True when older than `max_age`
    pub fn is_expired(&self, now: Instant, max_age: Duration) -> bool {
        self.age(now) > max_age
    }

    /// Consume the entry, releasing its handle.
    pub(crate) fn release(self) {
        self.handle.release();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_release_counts_once() {
        let counter = ReleaseCounter::new();
        let handle = ResourceHandle::new(Bytes::from_static(b"abc"), counter.clone());
        let view = handle.data();
        assert_eq!(counter.get(), 0);

        handle.release();
        assert_eq!(counter.get(), 1);
        // Outstanding views do not keep the handle alive
        assert_eq!(view.as_ref(), b"abc");
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_entry_expiry() {
        let counter = ReleaseCounter::new();
        let start = Instant::now();
        let entry = CacheEntry::new(
            "https://cdn/a.jpg".into(),
            ResourceHandle::new(Bytes::from(vec![0u8; 16]), counter.clone()),
            start,
            0,
        );

        assert_eq!(entry.size(), 16);
        assert!(!entry.is_expired(start + Duration::from_secs(10), Duration::from_secs(10)));
        assert!(entry.is_expired(
            start + Duration::from_secs(10) + Duration::from_millis(1),
            Duration::from_secs(10)
        ));

        entry.release();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_entry_drop_releases() {
        let counter = ReleaseCounter::new();
        {
            let _entry = CacheEntry::new(
                "u".into(),
                ResourceHandle::new(Bytes::new(), counter.clone()),
                Instant::now(),
                0,
            );
        }
        assert_eq!(counter.get(), 1);
    }
}
