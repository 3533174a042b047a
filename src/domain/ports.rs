//! Domain Ports (Port/Adapter Pattern)
//!
//! The pipeline depends only on these traits. Adapters in
//! [`crate::adapters`] provide the concrete HTTP fetcher and event sinks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │        ResourceFetcher        │        LoadEventSink         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │   HttpFetcher  │  LoggingEventSink  │ InMemoryEventCollector │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use super::events::LoadEvent;
use crate::error::Result;

/// Retrieves the bytes behind a fully formed URL.
///
/// The URL is opaque: CDN query parameters are part of the key and are
/// never interpreted here.
///
/// # Example
///
/// ```ignore
/// struct StaticFetcher;
///
/// #[async_trait]
/// impl ResourceFetcher for StaticFetcher {
///     async fn fetch(&self, url: &str) -> Result<Bytes> {
///         Ok(Bytes::from_static(b"\x89PNG"))
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the full body. Non-success responses are errors.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Receives every [`LoadEvent`] in completion order.
pub trait LoadEventSink: Send + Sync {
    /// Record one event. Must not fail; sinks swallow their own errors.
    fn publish(&self, event: &LoadEvent);
}

/// Told whenever the resource cache drops an entry.
///
/// Fires for eviction, expiry, removal and clear, never for replacement
/// of an entry under the same URL. Called without the cache lock held.
pub trait CacheEvictionListener: Send + Sync {
    /// `url` is no longer cached
    fn evicted(&self, url: &str);
}
