//! Load Events
//!
//! A [`LoadEvent`] is the immutable record of one completed load attempt.
//! Events are appended in completion order, which is not necessarily the
//! order in which the loads were requested.
//!
//! # Example
//!
//! ```ignore
//! let event = LoadEvent::success("https://cdn/a.jpg", 120, 48_213);
//! sink.publish(&event);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single load attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEvent {
    /// URL the attempt targeted
    pub source_url: String,

    /// Wall time spent on the attempt; 0 for cache hits
    pub load_time_ms: u64,

    /// Whether the resource was obtained
    pub success: bool,

    /// Completion time, milliseconds since the Unix epoch
    pub timestamp_ms: i64,

    /// Transferred size, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Served from the resource cache without a fetch
    #[serde(default)]
    pub from_cache: bool,
}

impl LoadEvent {
    /// A successful network load.
    pub fn success(source_url: impl Into<String>, load_time_ms: u64, size_bytes: u64) -> Self {
        Self {
            source_url: source_url.into(),
            load_time_ms,
            success: true,
            timestamp_ms: Utc::now().timestamp_millis(),
            size_bytes: Some(size_bytes),
            from_cache: false,
        }
    }

    /// A load satisfied by the cache.
    pub fn cache_hit(source_url: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            source_url: source_url.into(),
            load_time_ms: 0,
            success: true,
            timestamp_ms: Utc::now().timestamp_millis(),
            size_bytes: Some(size_bytes),
            from_cache: true,
        }
    }

    /// A failed load.
    pub fn failure(source_url: impl Into<String>, load_time_ms: u64) -> Self {
        Self {
            source_url: source_url.into(),
            load_time_ms,
            success: false,
            timestamp_ms: Utc::now().timestamp_millis(),
            size_bytes: None,
            from_cache: false,
        }
    }

    /// Short name used in logs.
    pub fn event_type(&self) -> &'static str {
        match (self.success, self.from_cache) {
            (true, true) => "CacheHit",
            (true, false) => "Loaded",
            (false, _) => "Failed",
        }
    }

    /// Completion time as a UTC timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }
}
