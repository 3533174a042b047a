//! Resource Cache
//!
//! Bounded in-memory store mapping a source URL to fetched bytes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ResourceCache                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  url ──▶ CacheEntry { handle, size, stored_at }              │
//! │  (stored_at, seq) ──▶ url      (eviction order index)        │
//! │                                                              │
//! │  get:  expired? ──▶ evict + absent                           │
//! │  put:  over budget? ──▶ evict oldest until room or empty     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - After every mutation the total size is within budget, or the cache
//!   holds exactly one entry that alone exceeds it
//! - Every handle is released exactly once (removal, eviction, expiry,
//!   replacement or clear)

mod entry;
mod store;
mod proptest;

pub use entry::{CacheEntry, ReleaseCounter, ResourceHandle};
pub use store::{CacheConfig, CacheStats, ResourceCache};

use std::time::Duration;

/// Default byte budget (50MB)
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 50 * 1024 * 1024;

/// Default maximum entry age (30 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 60);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        assert_eq!(DEFAULT_MAX_CACHE_SIZE, 50 * 1024 * 1024);
        assert_eq!(DEFAULT_MAX_AGE, Duration::from_secs(1800));
    }
}
