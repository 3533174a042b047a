//! Prometheus Exporter Adapter
//!
//! Exposes load outcomes and cache state in the Prometheus text format.
//! Counters are fed live as a `LoadEventSink`; gauges are refreshed from
//! snapshots with [`PrometheusExporter::observe`].

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::cache::CacheStats;
use crate::domain::{LoadEvent, LoadEventSink};
use crate::error::{Error, Result};
use crate::metrics::LoadSummary;

/// Load time histogram buckets, seconds
const LOAD_TIME_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

/// Prometheus registry for one media context
pub struct PrometheusExporter {
    registry: Registry,
    loads: IntCounterVec,
    load_time: Histogram,
    success_rate: Gauge,
    cache_hit_ratio: Gauge,
    bandwidth_bytes: IntGauge,
    cache_entries: IntGauge,
    cache_size_bytes: IntGauge,
    cache_evictions: IntGauge,
}

fn registration(e: prometheus::Error) -> Error {
    Error::Internal(format!("Failed to register metric: {}", e))
}

impl PrometheusExporter {
    /// Create an exporter with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let loads = IntCounterVec::new(
            Opts::new("mediaflow_loads_total", "Load attempts by outcome"),
            &["outcome"],
        )
        .map_err(registration)?;
        let load_time = Histogram::with_opts(
            HistogramOpts::new(
                "mediaflow_load_time_seconds",
                "Network load time of successful attempts",
            )
            .buckets(LOAD_TIME_BUCKETS.to_vec()),
        )
        .map_err(registration)?;
        let success_rate = Gauge::new("mediaflow_success_rate_percent", "Successful attempts")
            .map_err(registration)?;
        let cache_hit_ratio = Gauge::new(
            "mediaflow_cache_hit_ratio",
            "Share of events whose URL is cached",
        )
        .map_err(registration)?;
        let bandwidth_bytes =
            IntGauge::new("mediaflow_bandwidth_bytes", "Bytes transferred from the network")
                .map_err(registration)?;
        let cache_entries = IntGauge::new("mediaflow_cache_entries", "Resource cache entries")
            .map_err(registration)?;
        let cache_size_bytes =
            IntGauge::new("mediaflow_cache_size_bytes", "Resource cache size")
                .map_err(registration)?;
        let cache_evictions = IntGauge::new(
            "mediaflow_cache_evictions",
            "Entries evicted to make room",
        )
        .map_err(registration)?;

        registry.register(Box::new(loads.clone())).map_err(registration)?;
        registry.register(Box::new(load_time.clone())).map_err(registration)?;
        registry.register(Box::new(success_rate.clone())).map_err(registration)?;
        registry.register(Box::new(cache_hit_ratio.clone())).map_err(registration)?;
        registry.register(Box::new(bandwidth_bytes.clone())).map_err(registration)?;
        registry.register(Box::new(cache_entries.clone())).map_err(registration)?;
        registry.register(Box::new(cache_size_bytes.clone())).map_err(registration)?;
        registry.register(Box::new(cache_evictions.clone())).map_err(registration)?;

        Ok(Self {
            registry,
            loads,
            load_time,
            success_rate,
            cache_hit_ratio,
            bandwidth_bytes,
            cache_entries,
            cache_size_bytes,
            cache_evictions,
        })
    }

    /// Refresh gauges from snapshots
    pub fn observe(&self, summary: &LoadSummary, cache: &CacheStats) {
        self.success_rate.set(summary.success_rate);
        self.cache_hit_ratio.set(summary.cache_hit_ratio);
        self.bandwidth_bytes.set(summary.bandwidth_used as i64);
        self.cache_entries.set(cache.entries as i64);
        self.cache_size_bytes.set(cache.size_bytes as i64);
        self.cache_evictions.set(cache.evictions as i64);
    }

    /// Encode everything in the text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
    }

    /// Underlying registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl LoadEventSink for PrometheusExporter {
    fn publish(&self, event: &LoadEvent) {
        let outcome = match event.event_type() {
            "Loaded" => "loaded",
            "CacheHit" => "cache_hit",
            _ => "failed",
        };
        self.loads.with_label_values(&[outcome]).inc();
        if event.success && !event.from_cache {
            self.load_time.observe(event.load_time_ms as f64 / 1000.0);
        }
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish()
    }
}
