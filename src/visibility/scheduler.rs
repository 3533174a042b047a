//! Visibility Scheduler
//!
//! Turns viewport geometry into one-shot "this element is now visible"
//! triggers.
//!
//! # Lifecycle of a registration
//!
//! ```text
//! observe() ──▶ pending (no bounds) ──attach()──▶ watching
//!                                                   │
//!          update_viewport(): ratio >= threshold ───┤
//!          force_load() ────────────────────────────┤
//!                                                   ▼
//!                                     fired once, deregistered
//!
//! unobserve() / drop(handle) before firing ──▶ cancelled, no trigger
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use super::geometry::{Rect, RootMargin};
use super::{DEFAULT_ROOT_MARGIN, DEFAULT_THRESHOLD};
use crate::error::Result;

/// Identifier of an observed element
pub type ElementId = u64;

/// Observer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObserverConfig {
    /// Fraction of the element that must be visible
    pub threshold: f64,
    /// CSS-style margin grown around the viewport
    pub root_margin: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
        }
    }
}

/// Why a registration fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisibilityTrigger {
    /// The element crossed the visibility threshold
    Intersected,
    /// The host bypassed the observer
    Forced,
}

struct Registration {
    bounds: Option<Rect>,
    threshold: f64,
    visible: Arc<AtomicBool>,
    notify: oneshot::Sender<VisibilityTrigger>,
}

impl Registration {
    fn fire(self, trigger: VisibilityTrigger) {
        self.visible.store(true, Ordering::Release);
        // The receiver may be gone if the handle was dropped mid-flight
        let _ = self.notify.send(trigger);
    }
}

#[derive(Default)]
struct Registry {
    registrations: HashMap<ElementId, Registration>,
    viewport: Option<Rect>,
    next_id: ElementId,
}

/// Watches registered elements and fires each one at most once
pub struct VisibilityScheduler {
    config: ObserverConfig,
    margin: RootMargin,
    registry: Arc<Mutex<Registry>>,
}

impl VisibilityScheduler {
    /// Create a scheduler with default configuration
    pub fn new() -> Self {
        Self {
            config: ObserverConfig::default(),
            margin: RootMargin::parse(DEFAULT_ROOT_MARGIN).unwrap_or_default(),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Create a scheduler with custom configuration
    pub fn with_config(config: ObserverConfig) -> Result<Self> {
        let margin = RootMargin::parse(&config.root_margin)?;
        Ok(Self {
            config,
            margin,
            registry: Arc::new(Mutex::new(Registry::default())),
        })
    }

    /// Register a new element using the default threshold
    pub fn observe(&self) -> VisibilityHandle {
        self.observe_with_threshold(self.config.threshold)
    }

    /// Register a new element with its own threshold
    pub fn observe_with_threshold(&self, threshold: f64) -> VisibilityHandle {
        let (tx, rx) = oneshot::channel();
        let visible = Arc::new(AtomicBool::new(false));

        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.registrations.insert(
                id,
                Registration {
                    bounds: None,
                    threshold,
                    visible: visible.clone(),
                    notify: tx,
                },
            );
            id
        };

        VisibilityHandle {
            id,
            visible,
            receiver: Some(rx),
            fired: None,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Provide or update an element's bounds.
    ///
    /// Returns true if the element fired as a result. Elements without
    /// bounds are skipped by viewport updates until attached.
    pub fn attach(&self, id: ElementId, bounds: Rect) -> bool {
        let mut registry = self.registry.lock();
        let viewport = registry.viewport;

        let Some(registration) = registry.registrations.get_mut(&id) else {
            return false;
        };
        registration.bounds = Some(bounds);

        let fires = viewport
            .map(|vp| self.crosses_threshold(&bounds, &vp, registration.threshold))
            .unwrap_or(false);

        if fires {
            if let Some(registration) = registry.registrations.remove(&id) {
                debug!(element = id, "Element visible on attach");
                registration.fire(VisibilityTrigger::Intersected);
            }
        }
        fires
    }

    /// Re-evaluate every attached element against a new viewport.
    ///
    /// Returns the ids that fired.
    pub fn update_viewport(&self, viewport: Rect) -> Vec<ElementId> {
        let mut registry = self.registry.lock();
        registry.viewport = Some(viewport);

        let ready: Vec<ElementId> = registry
            .registrations
            .iter()
            .filter_map(|(id, reg)| {
                let bounds = reg.bounds?;
                self.crosses_threshold(&bounds, &viewport, reg.threshold)
                    .then_some(*id)
            })
            .collect();

        for id in &ready {
            if let Some(registration) = registry.registrations.remove(id) {
                registration.fire(VisibilityTrigger::Intersected);
            }
        }

        if !ready.is_empty() {
            debug!(count = ready.len(), "Elements became visible");
        }
        ready
    }

    /// Fire immediately, ignoring geometry. False if not registered.
    pub fn force_load(&self, id: ElementId) -> bool {
        let registration = self.registry.lock().registrations.remove(&id);
        match registration {
            Some(registration) => {
                debug!(element = id, "Forced visibility");
                registration.fire(VisibilityTrigger::Forced);
                true
            }
            None => false,
        }
    }

    /// Cancel a registration without firing. False if not registered.
    pub fn unobserve(&self, id: ElementId) -> bool {
        self.registry.lock().registrations.remove(&id).is_some()
    }

    /// Registrations that have not fired or been cancelled
    pub fn pending(&self) -> usize {
        self.registry.lock().registrations.len()
    }

    /// Cancel everything.
    pub fn disconnect(&self) {
        self.registry.lock().registrations.clear();
    }

    /// Active configuration
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    fn crosses_threshold(&self, bounds: &Rect, viewport: &Rect, threshold: f64) -> bool {
        let root = self.margin.expand(viewport);
        let ratio = bounds.intersection_ratio(&root);
        ratio > 0.0 && ratio >= threshold
    }
}

impl Default for VisibilityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VisibilityScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityScheduler")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Element-side end of a registration.
///
/// Dropping the handle before it fires cancels the registration.
pub struct VisibilityHandle {
    id: ElementId,
    visible: Arc<AtomicBool>,
    receiver: Option<oneshot::Receiver<VisibilityTrigger>>,
    fired: Option<VisibilityTrigger>,
    registry: Weak<Mutex<Registry>>,
}

impl VisibilityHandle {
    /// Element id, used with [`VisibilityScheduler::attach`]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Whether the element has fired
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Wait for the trigger. `None` if the registration was cancelled.
    ///
    /// Calling again after the trigger returns the same value immediately.
    pub async fn triggered(&mut self) -> Option<VisibilityTrigger> {
        if self.fired.is_some() {
            return self.fired;
        }
        let receiver = self.receiver.take()?;
        self.fired = receiver.await.ok();
        self.fired
    }

    /// Non-blocking check for the trigger.
    pub fn try_triggered(&mut self) -> Option<VisibilityTrigger> {
        if self.fired.is_some() {
            return self.fired;
        }
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(trigger) => {
                self.fired = Some(trigger);
                self.receiver = None;
                self.fired
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.receiver = None;
                None
            }
        }
    }
}

impl Drop for VisibilityHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().registrations.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for VisibilityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityHandle")
            .field("id", &self.id)
            .field("visible", &self.is_visible())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
