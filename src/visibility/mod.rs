//! Visibility Scheduling
//!
//! Defers work until an element enters the (margin-expanded) viewport.
//!
//! - [`VisibilityScheduler`] - one-shot visibility triggers per element
//! - [`BatchReveal`] - progressive reveal of long galleries
//! - [`geometry`] - rectangles, root margins, intersection ratios

pub mod geometry;
mod batch;
mod scheduler;

pub use batch::{BatchConfig, BatchReveal};
pub use geometry::{MarginValue, Rect, RootMargin};
pub use scheduler::{
    ElementId, ObserverConfig, VisibilityHandle, VisibilityScheduler, VisibilityTrigger,
};

use std::time::Duration;

/// Default visible fraction that triggers a load
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Default pre-trigger distance around the viewport
pub const DEFAULT_ROOT_MARGIN: &str = "50px";

/// Default gallery batch size
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Default delay before another batch may be revealed
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);
