//! Mediaflow Integration Tests
//!
//! End-to-end behavior across the cache, visibility scheduler, load
//! pipeline, metrics aggregator and video candidate resolver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use mediaflow::{Error, ResourceFetcher, Result};

const MB: u64 = 1024 * 1024;

/// Serves `size` zero bytes for any URL not marked as missing
#[derive(Default)]
struct StubFetcher {
    missing: Mutex<Vec<String>>,
    gate: Option<Arc<tokio::sync::Notify>>,
}

impl StubFetcher {
    fn failing(urls: &[&str]) -> Self {
        Self {
            missing: Mutex::new(urls.iter().map(|u| u.to_string()).collect()),
            gate: None,
        }
    }

    fn gated(gate: Arc<tokio::sync::Notify>) -> Self {
        Self {
            missing: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.missing.lock().iter().any(|m| m == url) {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(Bytes::from(vec![0u8; 1024]))
    }
}

// =============================================================================
// Resource Cache
// =============================================================================

mod cache_tests {
    use super::*;
    use mediaflow::clock::ManualClock;
    use mediaflow::{CacheConfig, ResourceCache};

    #[test]
    fn test_put_evicts_oldest_to_fit() {
        let cache = ResourceCache::with_config(CacheConfig {
            max_cache_size: 15 * MB,
            ..Default::default()
        });

        cache.put("a.jpg", Bytes::from(vec![1u8; (10 * MB) as usize]));
        cache.put("b.jpg", Bytes::from(vec![2u8; (10 * MB) as usize]));

        assert!(cache.get("a.jpg").is_none());
        let b = cache.get("b.jpg").unwrap();
        assert_eq!(b.len() as u64, 10 * MB);
        assert!(b.iter().all(|&byte| byte == 2));
        assert_eq!(cache.size(), 10 * MB);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_entry_expires_after_max_age() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResourceCache::with_clock(
            CacheConfig {
                max_age: Duration::from_secs(60),
                ..Default::default()
            },
            clock.clone(),
        );

        cache.put("a.jpg", Bytes::from_static(b"a"));
        clock.advance(Duration::from_secs(60));
        assert!(cache.get("a.jpg").is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("a.jpg").is_none());
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test]
    async fn test_preload_many_omits_failures() {
        let cache = ResourceCache::new();
        let fetcher = StubFetcher::failing(&["bad.jpg"]);
        let urls = vec!["ok.jpg".to_string(), "bad.jpg".to_string()];

        let loaded = cache.preload_many(&fetcher, &urls).await;
        assert_eq!(loaded.len(), 1);
        assert!(cache.contains("ok.jpg"));
        assert!(!cache.contains("bad.jpg"));
    }
}

// =============================================================================
// Video Candidates
// =============================================================================

mod video_tests {
    use mediaflow::{build_candidates, CandidateOptions, MediaDescriptor, PlaybackCursor, PlaybackStatus};

    #[test]
    fn test_candidate_order_with_file_id() {
        let descriptor = MediaDescriptor::new("https://host/x").with_file_id("F123");
        let candidates = build_candidates(&descriptor, &CandidateOptions::default());

        assert_eq!(candidates.len(), 4);
        assert!(candidates[0].contains("export=view") && candidates[0].contains("F123"));
        assert_eq!(candidates[1], "https://host/x");
        assert!(candidates[2].contains("export=download") && candidates[2].contains("F123"));
        assert!(candidates[3].ends_with("/F123/preview"));
    }

    #[test]
    fn test_candidates_without_file_id() {
        let descriptor = MediaDescriptor::new("https://host/x");
        let candidates = build_candidates(&descriptor, &CandidateOptions::default());
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c == "https://host/x"));
    }

    #[test]
    fn test_fallback_walks_every_candidate_once() {
        let descriptor = MediaDescriptor::new("https://host/x").with_file_id("F123");
        let mut cursor = PlaybackCursor::new(&descriptor, &CandidateOptions::default());

        let mut played = vec![cursor.current().unwrap().to_string()];
        while let PlaybackStatus::Retrying(url) = cursor.on_error() {
            played.push(url);
        }

        assert_eq!(played, cursor.candidates());
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.fallback_link(), Some("https://host/x"));
    }
}

// =============================================================================
// Visibility and Loading
// =============================================================================

mod loading_tests {
    use super::*;
    use mediaflow::visibility::{ObserverConfig, VisibilityTrigger};
    use mediaflow::{LoadState, MediaConfig, MediaContext, Rect};
    use tokio_test::{assert_pending, assert_ready_eq};

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1000.0, 800.0);

    fn config() -> MediaConfig {
        MediaConfig {
            observer: ObserverConfig {
                threshold: 0.1,
                root_margin: "0px".into(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_never_visible_until_forced() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let ctx = MediaContext::with_fetcher(config(), Arc::new(StubFetcher::gated(gate.clone())))
            .unwrap();

        let (resource, mut handle) = ctx.mount("https://cdn/far.jpg");
        ctx.scheduler().update_viewport(VIEWPORT);
        assert!(!ctx.scheduler().attach(handle.id(), Rect::new(0.0, 5000.0, 200.0, 200.0)));
        for offset in [100.0, 200.0, 300.0] {
            let viewport = Rect::new(0.0, offset, 1000.0, 800.0);
            assert!(ctx.scheduler().update_viewport(viewport).is_empty());
        }
        assert_eq!(handle.try_triggered(), None);
        assert_eq!(resource.state(), LoadState::Idle);

        assert!(ctx.scheduler().force_load(handle.id()));
        let task = {
            let resource = resource.clone();
            tokio::spawn(async move { resource.run_when_visible(&mut handle).await })
        };

        while resource.state() != LoadState::Loading {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        assert_eq!(task.await.unwrap().unwrap(), LoadState::Loaded);
        assert!(ctx.cache().contains("https://cdn/far.jpg"));
    }

    #[tokio::test]
    async fn test_visibility_fires_once() {
        let ctx = MediaContext::with_fetcher(config(), Arc::new(StubFetcher::default())).unwrap();
        let scheduler = ctx.scheduler();
        let mut handle = scheduler.observe();
        let id = handle.id();
        scheduler.attach(id, Rect::new(0.0, 1200.0, 100.0, 100.0));

        {
            let mut triggered = tokio_test::task::spawn(handle.triggered());
            assert_pending!(triggered.poll());

            assert_eq!(
                scheduler.update_viewport(Rect::new(0.0, 900.0, 1000.0, 800.0)),
                vec![id]
            );
            assert!(triggered.is_woken());
            assert_ready_eq!(triggered.poll(), Some(VisibilityTrigger::Intersected));
        }

        // Scrolling away and back produces no second trigger
        assert!(scheduler.update_viewport(VIEWPORT).is_empty());
        assert!(scheduler
            .update_viewport(Rect::new(0.0, 900.0, 1000.0, 800.0))
            .is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_scroll_into_view_loads() {
        let ctx = MediaContext::with_fetcher(config(), Arc::new(StubFetcher::default())).unwrap();
        let (resource, mut handle) = ctx.mount("https://cdn/below.jpg");
        ctx.scheduler().attach(handle.id(), Rect::new(0.0, 1000.0, 100.0, 100.0));

        let id = handle.id();
        let task = {
            let resource = resource.clone();
            tokio::spawn(async move { resource.run_when_visible(&mut handle).await })
        };

        assert_eq!(
            ctx.scheduler().update_viewport(Rect::new(0.0, 500.0, 1000.0, 800.0)),
            vec![id]
        );
        assert_eq!(task.await.unwrap().unwrap(), LoadState::Loaded);

        let summary = ctx.metrics().summary();
        assert_eq!(summary.total_images, 1);
        assert_eq!(summary.success_rate, 100.0);
        assert_eq!(summary.bandwidth_used, 1024);
    }

    #[tokio::test]
    async fn test_unmount_before_visible_cancels() {
        let ctx = MediaContext::with_fetcher(config(), Arc::new(StubFetcher::default())).unwrap();
        let (resource, handle) = ctx.mount("https://cdn/a.jpg");
        assert_eq!(ctx.scheduler().pending(), 1);

        drop(handle);
        assert_eq!(ctx.scheduler().pending(), 0);
        assert_eq!(resource.state(), LoadState::Idle);
        assert!(ctx.metrics().is_empty());
    }
}

// =============================================================================
// Batch Reveal
// =============================================================================

mod batch_tests {
    use super::*;
    use mediaflow::clock::ManualClock;
    use mediaflow::visibility::BatchConfig;
    use mediaflow::BatchReveal;

    #[test]
    fn test_batches_with_settle_delay() {
        let items: Vec<usize> = (0..20).collect();
        let clock = Arc::new(ManualClock::new());
        let config = BatchConfig {
            batch_size: 6,
            settle_delay: Duration::from_millis(300),
        };
        let mut reveal = BatchReveal::with_clock(items.len(), &config, clock.clone());

        assert_eq!(reveal.visible_items(&items), &items[0..6]);

        assert!(reveal.load_more());
        assert_eq!(reveal.visible_items(&items), &items[0..12]);

        // Rejected while settling, no state change
        assert!(!reveal.load_more());
        assert_eq!(reveal.visible_count(), 12);
        assert_eq!(reveal.current_batch(), 2);

        clock.advance(Duration::from_millis(300));
        assert!(reveal.load_more());
        assert_eq!(reveal.visible_count(), 18);

        clock.advance(Duration::from_millis(300));
        assert!(reveal.load_more());
        assert_eq!(reveal.visible_count(), 20);
        assert!(!reveal.has_more());
    }
}

// =============================================================================
// Metrics
// =============================================================================

mod metrics_tests {
    use super::*;
    use mediaflow::{LoadEvent, LoadState, MediaConfig, MediaContext, MetricsAggregator};

    #[test]
    fn test_reset_after_mixed_events() {
        let metrics = MetricsAggregator::new();
        metrics.record(LoadEvent::success("a", 100, 1000));
        metrics.record(LoadEvent::failure("b", 300));
        metrics.record(LoadEvent::success("c", 200, 2000));
        metrics.record(LoadEvent::failure("d", 50));
        metrics.record(LoadEvent::success("e", 300, 3000));

        let summary = metrics.summary();
        assert_eq!(summary.total_images, 5);
        assert_eq!(summary.success_rate, 60.0);
        assert_eq!(summary.average_load_time, 200.0);

        metrics.reset();
        let summary = metrics.summary();
        assert_eq!(summary.total_images, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_load_time, 0.0);
        assert_eq!(summary.bandwidth_used, 0);
    }

    #[tokio::test]
    async fn test_pipeline_feeds_metrics() {
        let ctx = MediaContext::with_fetcher(
            MediaConfig::default(),
            Arc::new(StubFetcher::failing(&["https://cdn/bad.jpg"])),
        )
        .unwrap();

        for url in ["https://cdn/a.jpg", "https://cdn/b.jpg", "https://cdn/bad.jpg"] {
            ctx.track(url).force_load().await.unwrap();
        }
        assert_eq!(
            ctx.track("https://cdn/a.jpg").force_load().await.unwrap(),
            LoadState::Loaded
        );

        let summary = ctx.metrics().summary();
        assert_eq!(summary.total_images, 4);
        assert_eq!(summary.success_rate, 75.0);
        // The cache hit transfers nothing
        assert_eq!(summary.bandwidth_used, 2048);
        assert_eq!(summary.cache_hit_ratio, 0.75);

        let report = ctx.metrics().report();
        assert!(report.contains("Total images:       4"));
    }
}
