//! Load Pipeline
//!
//! Drives each tracked resource through
//! `Idle → Visible → Loading → Loaded | Error`, consulting the shared
//! [`crate::cache::ResourceCache`] before fetching and reporting every
//! attempt to the [`crate::metrics::MetricsAggregator`].

mod loader;
mod state;

pub use loader::{LoadPipeline, PipelineConfig, TrackedResource};
pub use state::LoadState;
