//! Media Context
//!
//! Owns the state shared by every mounted element of one page session:
//! the resource cache, the metrics aggregator, the visibility scheduler
//! and the load pipeline built on top of them. Construct one with
//! [`MediaContext::init`] and release it with [`MediaContext::teardown`].

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::adapters::HttpFetcher;
use crate::cache::ResourceCache;
use crate::config::MediaConfig;
use crate::domain::{LoadEventSink, ResourceFetcher};
use crate::error::Result;
use crate::metrics::MetricsAggregator;
use crate::pipeline::{LoadPipeline, TrackedResource};
use crate::video::{MediaDescriptor, PlaybackCursor};
use crate::visibility::{BatchReveal, VisibilityHandle, VisibilityScheduler};

/// Process-scoped media state
pub struct MediaContext {
    config: MediaConfig,
    cache: Arc<ResourceCache>,
    metrics: Arc<MetricsAggregator>,
    scheduler: VisibilityScheduler,
    fetcher: Arc<dyn ResourceFetcher>,
    pipeline: Arc<LoadPipeline>,
}

impl MediaContext {
    /// Create a context that fetches over HTTP
    pub fn init(config: MediaConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_timeout(config.pipeline.fetch_timeout)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a context around a custom fetcher
    pub fn with_fetcher(config: MediaConfig, fetcher: Arc<dyn ResourceFetcher>) -> Result<Self> {
        Self::with_sinks(config, fetcher, Vec::new())
    }

    /// Create a context whose pipeline also reports to `sinks`
    pub fn with_sinks(
        config: MediaConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        sinks: Vec<Arc<dyn LoadEventSink>>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(ResourceCache::with_config(config.cache.clone()));
        let metrics = Arc::new(MetricsAggregator::new());
        let scheduler = VisibilityScheduler::with_config(config.observer.clone())?;

        let pipeline = sinks.into_iter().fold(
            LoadPipeline::new(
                cache.clone(),
                fetcher.clone(),
                metrics.clone(),
                config.pipeline.clone(),
            ),
            LoadPipeline::with_sink,
        );

        info!(
            max_cache_size = config.cache.max_cache_size,
            max_age_ms = config.cache.max_age.as_millis() as u64,
            threshold = config.observer.threshold,
            root_margin = %config.observer.root_margin,
            "Media context initialized"
        );

        Ok(Self {
            config,
            cache,
            metrics,
            scheduler,
            fetcher,
            pipeline: Arc::new(pipeline),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Shared resource cache
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    /// Visibility scheduler
    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }

    /// Load pipeline
    pub fn pipeline(&self) -> &Arc<LoadPipeline> {
        &self.pipeline
    }

    /// Track a resource without observing it
    pub fn track(&self, url: impl Into<String>) -> Arc<TrackedResource> {
        self.pipeline.track(url)
    }

    /// Track a resource and register its element for visibility
    pub fn mount(&self, url: impl Into<String>) -> (Arc<TrackedResource>, VisibilityHandle) {
        (self.pipeline.track(url), self.scheduler.observe())
    }

    /// Batch reveal for a gallery of `total` items
    pub fn batch(&self, total: usize) -> BatchReveal {
        BatchReveal::new(total, &self.config.batch)
    }

    /// Playback cursor for a video
    pub fn playback(&self, descriptor: &MediaDescriptor) -> PlaybackCursor {
        PlaybackCursor::new(descriptor, &self.config.video)
    }

    /// Warm the cache. Failed URLs are omitted from the result.
    pub async fn preload(&self, urls: &[String]) -> HashMap<String, Bytes> {
        let loaded = self.cache.preload_many(self.fetcher.as_ref(), urls).await;
        for url in loaded.keys() {
            self.metrics.note_cached(url);
        }
        loaded
    }

    /// Release everything: cancel observations, drop cached handles and
    /// start a new metrics window. Safe to call more than once.
    pub fn teardown(&self) {
        let pending = self.scheduler.pending();
        let stats = self.cache.stats();

        self.scheduler.disconnect();
        self.cache.clear();
        self.metrics.reset();

        info!(
            cancelled = pending,
            released = stats.entries,
            "Media context torn down"
        );
    }
}

impl std::fmt::Debug for MediaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaContext")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryEventCollector;
    use crate::error::Error;
    use crate::pipeline::LoadState;
    use crate::visibility::VisibilityTrigger;
    use async_trait::async_trait;

    struct EchoFetcher;

    #[async_trait]
    impl ResourceFetcher for EchoFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            if url.contains("missing") {
                return Err(Error::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(Bytes::copy_from_slice(url.as_bytes()))
        }
    }

    fn context() -> MediaContext {
        MediaContext::with_fetcher(MediaConfig::default(), Arc::new(EchoFetcher)).unwrap()
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let mut config = MediaConfig::default();
        config.observer.root_margin = "wide".into();
        assert!(MediaContext::with_fetcher(config, Arc::new(EchoFetcher)).is_err());
    }

    #[tokio::test]
    async fn test_mount_and_force() {
        let ctx = context();
        let (resource, mut handle) = ctx.mount("https://cdn/a.jpg");
        assert_eq!(ctx.scheduler().pending(), 1);

        ctx.scheduler().force_load(handle.id());
        assert_eq!(
            resource.run_when_visible(&mut handle).await.unwrap(),
            LoadState::Loaded
        );
        assert_eq!(handle.try_triggered(), Some(VisibilityTrigger::Forced));
        assert!(ctx.cache().contains("https://cdn/a.jpg"));
    }

    #[tokio::test]
    async fn test_shared_across_mounts() {
        let ctx = context();
        ctx.track("https://cdn/a.jpg").force_load().await.unwrap();
        ctx.track("https://cdn/a.jpg").force_load().await.unwrap();

        assert_eq!(ctx.metrics().served_from_cache(), 1);
        assert_eq!(ctx.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_preload_omits_failures() {
        let ctx = context();
        let urls = vec!["https://cdn/a.jpg".to_string(), "https://cdn/missing.jpg".to_string()];
        let loaded = ctx.preload(&urls).await;

        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("https://cdn/a.jpg"));
        assert!(!ctx.cache().contains("https://cdn/missing.jpg"));
    }

    #[tokio::test]
    async fn test_extra_sinks() {
        let collector = Arc::new(InMemoryEventCollector::new());
        let ctx = MediaContext::with_sinks(
            MediaConfig::default(),
            Arc::new(EchoFetcher),
            vec![collector.clone() as Arc<dyn LoadEventSink>],
        )
        .unwrap();

        ctx.track("https://cdn/missing.jpg").force_load().await.unwrap();
        assert_eq!(collector.failures().len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_releases_everything() {
        let ctx = context();
        let _handle = ctx.scheduler().observe();
        ctx.track("https://cdn/a.jpg").force_load().await.unwrap();

        ctx.teardown();
        assert_eq!(ctx.scheduler().pending(), 0);
        assert!(ctx.cache().is_empty());
        assert_eq!(ctx.cache().stats().releases, 1);
        assert!(ctx.metrics().is_empty());

        // Idempotent
        ctx.teardown();
    }

    #[test]
    fn test_batch_and_playback_use_config() {
        let mut config = MediaConfig::default();
        config.batch.batch_size = 4;
        config.video.dedupe = true;
        let ctx = MediaContext::with_fetcher(config, Arc::new(EchoFetcher)).unwrap();

        assert_eq!(ctx.batch(10).visible_count(), 4);
        let cursor = ctx.playback(&MediaDescriptor::new("https://host/x"));
        assert_eq!(cursor.candidates().len(), 1);
    }
}
