//! Text Report
//!
//! The "improvement" figures compare measured totals against a fixed
//! per-image baseline for an uncached, unoptimized load. They are rough
//! estimates, not measured deltas.

use std::fmt::Write;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::aggregator::{LoadSummary, MetricsAggregator};

/// Assumed transfer size of one image without caching or CDN resizing
pub const BASELINE_BYTES_PER_IMAGE: u64 = 500 * 1024;

/// Assumed load time of one image without caching or CDN resizing
pub const BASELINE_LOAD_TIME_MS: u64 = 2000;

/// Estimated savings against the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementEstimate {
    /// Baseline bytes minus bytes actually transferred, floored at zero
    pub bandwidth_saved_bytes: u64,
    /// Baseline time minus measured time over successes, floored at zero
    pub load_time_saved_ms: u64,
}

impl MetricsAggregator {
    /// Estimated savings for the current window
    pub fn estimate_improvement(&self) -> ImprovementEstimate {
        let summary = self.summary();
        let baseline_bytes = summary.total_images * BASELINE_BYTES_PER_IMAGE;
        let baseline_time = self.successes() * BASELINE_LOAD_TIME_MS;

        ImprovementEstimate {
            bandwidth_saved_bytes: baseline_bytes.saturating_sub(summary.bandwidth_used),
            load_time_saved_ms: baseline_time.saturating_sub(self.total_success_time_ms()),
        }
    }

    /// Human-readable, timestamped snapshot
    pub fn report(&self) -> String {
        render_report(&self.summary(), &self.estimate_improvement())
    }
}

fn render_report(summary: &LoadSummary, improvement: &ImprovementEstimate) -> String {
    let mut out = String::new();
    let generated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let _ = writeln!(out, "Image Performance Report ({})", generated);
    let _ = writeln!(out, "==========================================");
    let _ = writeln!(out, "Total images:       {}", summary.total_images);
    let _ = writeln!(out, "Success rate:       {:.1}%", summary.success_rate);
    let _ = writeln!(out, "Average load time:  {:.0} ms", summary.average_load_time);
    let _ = writeln!(out, "Bandwidth used:     {}", format_bytes(summary.bandwidth_used));
    let _ = writeln!(out, "Cache hit ratio:    {:.1}%", summary.cache_hit_ratio * 100.0);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Estimated improvements (vs. {} / {} ms per uncached image, not measured):",
        format_bytes(BASELINE_BYTES_PER_IMAGE),
        BASELINE_LOAD_TIME_MS
    );
    let _ = writeln!(
        out,
        "Bandwidth saved:    {}",
        format_bytes(improvement.bandwidth_saved_bytes)
    );
    let _ = writeln!(out, "Load time saved:    {} ms", improvement.load_time_saved_ms);
    out
}

/// Format a byte count with a binary unit
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
