//! Metrics module
//!
//! Load outcome aggregation and the diagnostic text report.

mod aggregator;
mod report;

pub use aggregator::{LoadSummary, MetricsAggregator};
pub use report::{
    format_bytes, ImprovementEstimate, BASELINE_BYTES_PER_IMAGE, BASELINE_LOAD_TIME_MS,
};
