//! Load State Machine
//!
//! ```text
//! Idle ──▶ Visible ──▶ Loading ──▶ Loaded
//!   │                   ▲   │
//!   └── force/preload ──┘   └────▶ Error ──retry──▶ Loading
//! ```

use serde::Serialize;

/// Per-resource load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LoadState {
    /// Registered, not yet visible
    #[default]
    Idle,
    /// Became visible, load not yet dispatched
    Visible,
    /// Load in flight
    Loading,
    /// Bytes available
    Loaded,
    /// Last attempt failed
    Error,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "Idle"),
            LoadState::Visible => write!(f, "Visible"),
            LoadState::Loading => write!(f, "Loading"),
            LoadState::Loaded => write!(f, "Loaded"),
            LoadState::Error => write!(f, "Error"),
        }
    }
}

impl LoadState {
    /// Check whether the state machine allows `self -> next`.
    pub fn can_transition_to(&self, next: LoadState) -> bool {
        matches!(
            (self, next),
            (LoadState::Idle, LoadState::Visible)
                | (LoadState::Idle, LoadState::Loading)
                | (LoadState::Visible, LoadState::Loading)
                | (LoadState::Loading, LoadState::Loaded)
                | (LoadState::Loading, LoadState::Error)
                | (LoadState::Error, LoadState::Loading)
        )
    }
}
