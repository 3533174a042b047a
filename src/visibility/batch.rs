//! Batch Reveal
//!
//! Progressive gallery reveal: the first `batch_size` items are visible
//! up front, each `load_more` extends the visible prefix by one batch.
//! A reveal blocks further reveals until its settle delay has passed.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scheduler::{ElementId, VisibilityHandle, VisibilityTrigger};
use super::{DEFAULT_BATCH_SIZE, DEFAULT_SETTLE_DELAY};
use crate::clock::{self, SharedClock};

/// Batch reveal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchConfig {
    /// Items per batch
    pub batch_size: usize,
    /// Minimum time between reveals
    #[serde(with = "crate::config::duration_ms", rename = "settleDelayMs")]
    pub settle_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Tracks how much of an ordered item list is revealed
#[derive(Debug)]
pub struct BatchReveal {
    total: usize,
    batch_size: usize,
    current_batch: usize,
    settle_delay: Duration,
    settling_until: Option<Instant>,
    last_sentinel: Option<ElementId>,
    clock: SharedClock,
}

impl BatchReveal {
    /// Reveal `total` items in batches, reading time from the system clock
    pub fn new(total: usize, config: &BatchConfig) -> Self {
        Self::with_clock(total, config, clock::system())
    }

    /// Reveal `total` items in batches using `clock`
    pub fn with_clock(total: usize, config: &BatchConfig, clock: SharedClock) -> Self {
        Self {
            total,
            batch_size: config.batch_size.max(1),
            current_batch: 1,
            settle_delay: config.settle_delay,
            settling_until: None,
            last_sentinel: None,
            clock,
        }
    }

    /// Number of revealed items (a prefix of the list)
    pub fn visible_count(&self) -> usize {
        self.batch_size
            .saturating_mul(self.current_batch)
            .min(self.total)
    }

    /// Revealed slice of `items`
    pub fn visible_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible_count().min(items.len())]
    }

    /// Current batch number, starting at 1
    pub fn current_batch(&self) -> usize {
        self.current_batch
    }

    /// Items remain hidden
    pub fn has_more(&self) -> bool {
        self.visible_count() < self.total
    }

    /// A previous reveal is still inside its settle delay
    pub fn is_settling(&self) -> bool {
        self.settling_until
            .map(|until| self.clock.now() < until)
            .unwrap_or(false)
    }

    /// Reveal the next batch. Returns false with no change while settling
    /// or when everything is already visible.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        if self.is_settling() {
            debug!(batch = self.current_batch, "Reveal still settling, ignoring load_more");
            return false;
        }

        self.current_batch += 1;
        self.settling_until = Some(self.clock.now() + self.settle_delay);
        debug!(
            batch = self.current_batch,
            visible = self.visible_count(),
            total = self.total,
            "Revealed next batch"
        );
        true
    }

    /// Reveal the next batch once the sentinel element becomes visible.
    ///
    /// Visibility handles fire once, so a sentinel drives at most one
    /// reveal: observe a fresh sentinel for every batch. Passing the
    /// handle that drove the previous reveal returns false at once.
    ///
    /// Returns false if the sentinel was cancelled or reused, or the
    /// reveal was rejected.
    pub async fn load_more_when_visible(&mut self, sentinel: &mut VisibilityHandle) -> bool {
        if self.last_sentinel == Some(sentinel.id()) {
            debug!(element = sentinel.id(), "Sentinel already consumed");
            return false;
        }
        match sentinel.triggered().await {
            Some(VisibilityTrigger::Intersected) | Some(VisibilityTrigger::Forced) => {
                self.last_sentinel = Some(sentinel.id());
                self.load_more()
            }
            None => false,
        }
    }

    /// Back to the first batch
    pub fn reset(&mut self) {
        self.current_batch = 1;
        self.settling_until = None;
        self.last_sentinel = None;
    }
}
