//! Load Pipeline
//!
//! check cache → fetch if absent → populate cache → report outcome.
//!
//! # Ordering
//!
//! On success the cache is written (and the metrics side table updated)
//! strictly before the [`LoadEvent`] is emitted. Locks are never held
//! across the fetch. The metrics side table follows the cache: every
//! eviction, expiry or removal is reported back to the aggregator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::state::LoadState;
use crate::adapters::CompositeEventSink;
use crate::cache::ResourceCache;
use crate::domain::{LoadEvent, LoadEventSink, ResourceFetcher};
use crate::error::{Error, Result};
use crate::metrics::MetricsAggregator;
use crate::visibility::{VisibilityHandle, VisibilityTrigger};

/// Load pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Abort fetches that take longer than this. `None` waits forever.
    #[serde(
        with = "crate::config::option_duration_ms",
        rename = "fetchTimeoutMs",
        skip_serializing_if = "Option::is_none"
    )]
    pub fetch_timeout: Option<Duration>,
}

/// Shared fetch/cache/report orchestration
pub struct LoadPipeline {
    cache: Arc<ResourceCache>,
    fetcher: Arc<dyn ResourceFetcher>,
    metrics: Arc<MetricsAggregator>,
    sinks: CompositeEventSink,
    config: PipelineConfig,
}

impl LoadPipeline {
    /// Create a pipeline over shared cache and metrics
    pub fn new(
        cache: Arc<ResourceCache>,
        fetcher: Arc<dyn ResourceFetcher>,
        metrics: Arc<MetricsAggregator>,
        config: PipelineConfig,
    ) -> Self {
        cache.subscribe(metrics.clone());
        Self {
            cache,
            fetcher,
            metrics,
            sinks: CompositeEventSink::new(),
            config,
        }
    }

    /// Also deliver events to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn LoadEventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Start tracking a resource in `Idle`
    pub fn track(self: &Arc<Self>, url: impl Into<String>) -> Arc<TrackedResource> {
        Arc::new(TrackedResource {
            url: url.into(),
            pipeline: Arc::clone(self),
            inner: Mutex::new(ResourceState::default()),
        })
    }

    /// Shared cache
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one attempt for `url`. Never fails: the outcome is the event.
    #[instrument(skip(self))]
    async fn attempt(&self, url: &str) -> (LoadEvent, Option<Bytes>, Option<Error>) {
        if let Some(data) = self.cache.get(url) {
            debug!("Cache hit");
            let event = LoadEvent::cache_hit(url, data.len() as u64);
            self.emit(&event);
            return (event, Some(data), None);
        }

        let start = Instant::now();
        let result = match self.config.fetch_timeout {
            Some(limit) => match timeout(limit, self.fetcher.fetch(url)).await {
                Ok(result) => result,
                Err(_) => Err(Error::FetchTimeout {
                    url: url.to_string(),
                    timeout: limit,
                }),
            },
            None => self.fetcher.fetch(url).await,
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                let size = data.len() as u64;
                let data = self.cache.put(url, data);
                self.metrics.note_cached(url);

                let event = LoadEvent::success(url, elapsed_ms, size);
                self.emit(&event);
                (event, Some(data), None)
            }
            Err(e) => {
                warn!("Failed to load {}: {}", url, e);
                let event = LoadEvent::failure(url, elapsed_ms);
                self.emit(&event);
                (event, None, Some(e))
            }
        }
    }

    fn emit(&self, event: &LoadEvent) {
        self.metrics.record(event.clone());
        self.sinks.publish(event);
    }
}

impl std::fmt::Debug for LoadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadPipeline")
            .field("config", &self.config)
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

#[derive(Debug, Default)]
struct ResourceState {
    state: LoadState,
    data: Option<Bytes>,
    last_error: Option<String>,
    attempts: u32,
}

/// One UI element's resource and its load state
pub struct TrackedResource {
    url: String,
    pipeline: Arc<LoadPipeline>,
    inner: Mutex<ResourceState>,
}

impl TrackedResource {
    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current state
    pub fn state(&self) -> LoadState {
        self.inner.lock().state
    }

    /// Loaded bytes, when `Loaded`
    pub fn data(&self) -> Option<Bytes> {
        self.inner.lock().data.clone()
    }

    /// Message of the last failure, when `Error`
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Attempts dispatched so far
    pub fn attempts(&self) -> u32 {
        self.inner.lock().attempts
    }

    /// `Idle → Visible`
    pub fn mark_visible(&self) -> Result<()> {
        self.transition(LoadState::Visible).map(|_| ())
    }

    /// `Visible → Loading → Loaded | Error`
    pub async fn load(&self) -> Result<LoadState> {
        self.expect_state(LoadState::Visible)?;
        self.transition(LoadState::Loading)?;
        Ok(self.run().await)
    }

    /// Bypass visibility: mark visible and load at once.
    ///
    /// A resource already loading or loaded is left alone.
    pub async fn force_load(&self) -> Result<LoadState> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                LoadState::Loading | LoadState::Loaded => return Ok(inner.state),
                LoadState::Idle | LoadState::Visible => {
                    inner.state = LoadState::Loading;
                    inner.attempts += 1;
                }
                LoadState::Error => {
                    return Err(Error::InvalidTransition {
                        from: LoadState::Error.to_string(),
                        to: LoadState::Visible.to_string(),
                    })
                }
            }
        }
        Ok(self.run().await)
    }

    /// `Error → Loading`, one attempt per call
    pub async fn retry(&self) -> Result<LoadState> {
        self.expect_state(LoadState::Error)?;
        self.transition(LoadState::Loading)?;
        debug!(url = %self.url, "Retrying load");
        Ok(self.run().await)
    }

    /// Wait for the element's visibility trigger, then load.
    ///
    /// A cancelled registration leaves the resource untouched.
    pub async fn run_when_visible(&self, handle: &mut VisibilityHandle) -> Result<LoadState> {
        match handle.triggered().await {
            Some(VisibilityTrigger::Intersected) => {
                self.mark_visible()?;
                self.load().await
            }
            Some(VisibilityTrigger::Forced) => self.force_load().await,
            None => Ok(self.state()),
        }
    }

    fn expect_state(&self, expected: LoadState) -> Result<()> {
        let current = self.state();
        if current == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: current.to_string(),
                to: LoadState::Loading.to_string(),
            })
        }
    }

    fn transition(&self, next: LoadState) -> Result<LoadState> {
        let mut inner = self.inner.lock();
        if !inner.state.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: inner.state.to_string(),
                to: next.to_string(),
            });
        }
        if next == LoadState::Loading {
            inner.attempts += 1;
        }
        inner.state = next;
        Ok(next)
    }

    async fn run(&self) -> LoadState {
        let (event, data, error) = self.pipeline.attempt(&self.url).await;

        let mut inner = self.inner.lock();
        if event.success {
            inner.state = LoadState::Loaded;
            inner.data = data;
            inner.last_error = None;
        } else {
            inner.state = LoadState::Error;
            inner.data = None;
            inner.last_error = error.map(|e| e.to_string());
        }
        inner.state
    }
}

impl std::fmt::Debug for TrackedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedResource")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
