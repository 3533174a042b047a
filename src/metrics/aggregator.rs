//! Metrics Aggregator
//!
//! Folds the [`LoadEvent`] sequence into running totals. The sequence is
//! kept alongside the counters so the counters can always be checked
//! against it; nothing is persisted.

use std::collections::HashSet;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::domain::{CacheEvictionListener, LoadEvent, LoadEventSink};

/// Point-in-time summary of load outcomes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// Load attempts recorded
    pub total_images: u64,
    /// Successful attempts, percent
    pub success_rate: f64,
    /// Mean load time over successful attempts, milliseconds
    pub average_load_time: f64,
    /// Bytes transferred from the network
    pub bandwidth_used: u64,
    /// Share of events whose URL is known to be cached, 0.0 - 1.0
    pub cache_hit_ratio: f64,
}

impl LoadSummary {
    /// Summary of an empty window
    pub fn empty() -> Self {
        Self {
            total_images: 0,
            success_rate: 0.0,
            average_load_time: 0.0,
            bandwidth_used: 0,
            cache_hit_ratio: 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct AggregatorState {
    events: Vec<LoadEvent>,
    total: u64,
    successes: u64,
    failures: u64,
    served_from_cache: u64,
    success_time_ms: u64,
    bytes_transferred: u64,
    cached_urls: HashSet<String>,
}

/// Aggregates load outcomes for diagnostics
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    state: Mutex<AggregatorState>,
}

impl MetricsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event and update the totals
    pub fn record(&self, event: LoadEvent) {
        let mut state = self.state.lock();
        state.total += 1;
        if event.success {
            state.successes += 1;
            state.success_time_ms += event.load_time_ms;
        } else {
            state.failures += 1;
        }
        if event.from_cache {
            state.served_from_cache += 1;
        } else if let Some(size) = event.size_bytes {
            state.bytes_transferred += size;
        }
        debug!(
            url = %event.source_url,
            success = event.success,
            load_time_ms = event.load_time_ms,
            "Recorded load event"
        );
        state.events.push(event);
    }

    /// Mark `url` as present in the resource cache
    pub fn note_cached(&self, url: &str) {
        self.state.lock().cached_urls.insert(url.to_string());
    }

    /// Mark `url` as no longer cached
    pub fn forget_cached(&self, url: &str) {
        self.state.lock().cached_urls.remove(url);
    }

    /// Current summary
    pub fn summary(&self) -> LoadSummary {
        let state = self.state.lock();
        if state.total == 0 {
            return LoadSummary::empty();
        }

        let cache_hits = state
            .events
            .iter()
            .filter(|e| state.cached_urls.contains(&e.source_url))
            .count();

        LoadSummary {
            total_images: state.total,
            success_rate: state.successes as f64 / state.total as f64 * 100.0,
            average_load_time: if state.successes == 0 {
                0.0
            } else {
                state.success_time_ms as f64 / state.successes as f64
            },
            bandwidth_used: state.bytes_transferred,
            cache_hit_ratio: cache_hits as f64 / state.total as f64,
        }
    }

    /// Successful attempts
    pub fn successes(&self) -> u64 {
        self.state.lock().successes
    }

    /// Failed attempts
    pub fn failures(&self) -> u64 {
        self.state.lock().failures
    }

    /// Attempts satisfied by the cache without a fetch
    pub fn served_from_cache(&self) -> u64 {
        self.state.lock().served_from_cache
    }

    /// Sum of successful load times, milliseconds
    pub fn total_success_time_ms(&self) -> u64 {
        self.state.lock().success_time_ms
    }

    /// Copy of the event sequence in completion order
    pub fn events(&self) -> Vec<LoadEvent> {
        self.state.lock().events.clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    /// No events recorded
    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    /// Start a new measurement window
    pub fn reset(&self) {
        *self.state.lock() = AggregatorState::default();
        debug!("Metrics reset");
    }
}

impl LoadEventSink for MetricsAggregator {
    fn publish(&self, event: &LoadEvent) {
        self.record(event.clone());
    }
}

impl CacheEvictionListener for MetricsAggregator {
    fn evicted(&self, url: &str) {
        self.forget_cached(url);
    }
}

// =============================================================================
// Tests
// =============================================================================
