//! Mediaflow - Media Delivery Pipeline
//!
//! Decides when images are fetched, keeps fetched bytes in a bounded
//! cache, measures how loads went, and repairs broken video links by
//! walking alternative URLs.
//!
//! # Architecture
//!
//! ```text
//! element mounts → VisibilityScheduler → LoadPipeline → ResourceCache
//!                                             │            │ miss
//!                                             │            ▼
//!                                             │      ResourceFetcher
//!                                             ▼
//!                                     MetricsAggregator
//!
//! video descriptor → build_candidates → PlaybackCursor (player retry loop)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - HTTP fetcher, event sinks, Prometheus exporter
//! - [`cache`] - Size and age bounded resource cache
//! - [`clock`] - Time source abstraction
//! - [`config`] - YAML configuration
//! - [`context`] - Process-scoped [`MediaContext`]
//! - [`domain`] - Load events and ports
//! - [`error`] - Error types
//! - [`metrics`] - Load outcome aggregation and reports
//! - [`pipeline`] - Per-resource load state machine
//! - [`video`] - Video candidate URLs and playback cursor
//! - [`visibility`] - Visibility scheduling and batch reveal

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod video;
pub mod visibility;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheStats, ResourceCache};
pub use config::MediaConfig;
pub use context::MediaContext;
pub use domain::{LoadEvent, LoadEventSink, ResourceFetcher};
pub use error::{Error, Result};
pub use metrics::{LoadSummary, MetricsAggregator};
pub use pipeline::{LoadPipeline, LoadState, PipelineConfig, TrackedResource};
pub use video::{build_candidates, CandidateOptions, MediaDescriptor, PlaybackCursor, PlaybackStatus};
pub use visibility::{BatchReveal, Rect, VisibilityHandle, VisibilityScheduler};

/// Crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
