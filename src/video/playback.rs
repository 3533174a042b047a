//! Playback cursor over a candidate list
//!
//! The cursor only moves forward. Once the last candidate fails the
//! cursor is exhausted for good and the original link is offered for
//! manual opening.

use serde::Serialize;
use tracing::{debug, warn};

use super::candidates::{build_candidates, CandidateOptions, MediaDescriptor};

/// Result of reporting a playback error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    /// Try this candidate next
    Retrying(String),
    /// No candidates left
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Attempting,
    Playing,
    Exhausted,
}

/// Tracks which candidate the player is on
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    candidates: Vec<String>,
    index: usize,
    phase: Phase,
    fallback: String,
}

impl PlaybackCursor {
    /// Build the candidate list for `descriptor` and start at the first entry
    pub fn new(descriptor: &MediaDescriptor, options: &CandidateOptions) -> Self {
        Self::from_candidates(
            build_candidates(descriptor, options),
            descriptor.primary_url.clone(),
        )
    }

    /// Walk an explicit list. An empty list starts exhausted.
    pub fn from_candidates(candidates: Vec<String>, fallback: impl Into<String>) -> Self {
        let phase = if candidates.is_empty() {
            Phase::Exhausted
        } else {
            Phase::Attempting
        };
        Self {
            candidates,
            index: 0,
            phase,
            fallback: fallback.into(),
        }
    }

    /// Candidate to play, `None` once exhausted
    pub fn current(&self) -> Option<&str> {
        match self.phase {
            Phase::Exhausted => None,
            _ => self.candidates.get(self.index).map(String::as_str),
        }
    }

    /// Position in the candidate list
    pub fn index(&self) -> usize {
        self.index
    }

    /// All candidates in order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The player reported an error for the current candidate.
    pub fn on_error(&mut self) -> PlaybackStatus {
        if self.phase == Phase::Exhausted {
            return PlaybackStatus::Exhausted;
        }

        if self.index + 1 < self.candidates.len() {
            self.index += 1;
            self.phase = Phase::Attempting;
            let next = self.candidates[self.index].clone();
            debug!(index = self.index, url = %next, "Advancing to next video candidate");
            PlaybackStatus::Retrying(next)
        } else {
            self.phase = Phase::Exhausted;
            warn!(
                attempts = self.candidates.len(),
                fallback = %self.fallback,
                "All video candidates failed"
            );
            PlaybackStatus::Exhausted
        }
    }

    /// The player started playing the current candidate.
    pub fn on_success(&mut self) {
        if self.phase == Phase::Attempting {
            self.phase = Phase::Playing;
        }
    }

    /// Current candidate is playing
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Terminal failure reached
    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    /// Original link for manual opening, offered only after exhaustion
    pub fn fallback_link(&self) -> Option<&str> {
        self.is_exhausted().then_some(self.fallback.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn four() -> PlaybackCursor {
        let descriptor = MediaDescriptor::new("https://host/x").with_file_id("F123");
        PlaybackCursor::new(&descriptor, &CandidateOptions::default())
    }

    #[test]
    fn test_starts_at_first_candidate() {
        let cursor = four();
        assert_eq!(cursor.index(), 0);
        assert_eq!(
            cursor.current(),
            Some("https://drive.google.com/uc?export=view&id=F123")
        );
        assert_eq!(cursor.fallback_link(), None);
    }

    #[test]
    fn test_last_candidate_attempted_once() {
        let mut cursor = four();
        let mut attempted = vec![cursor.current().unwrap().to_string()];

        for _ in 0..3 {
            match cursor.on_error() {
                PlaybackStatus::Retrying(url) => attempted.push(url),
                PlaybackStatus::Exhausted => panic!("exhausted early"),
            }
        }
        assert_eq!(attempted, cursor.candidates());
        assert_eq!(cursor.index(), 3);

        assert_eq!(cursor.on_error(), PlaybackStatus::Exhausted);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.fallback_link(), Some("https://host/x"));

        // Terminal: no wrap, no further attempts
        assert_eq!(cursor.on_error(), PlaybackStatus::Exhausted);
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn test_index_never_decreases() {
        let mut cursor = four();
        let mut last = cursor.index();
        for _ in 0..10 {
            cursor.on_error();
            assert!(cursor.index() >= last);
            last = cursor.index();
        }
    }

    #[test]
    fn test_success_stops_advancing() {
        let mut cursor = four();
        assert_matches!(cursor.on_error(), PlaybackStatus::Retrying(_));
        cursor.on_success();
        assert!(cursor.is_playing());
        assert_eq!(cursor.current(), Some("https://host/x"));
    }

    #[test]
    fn test_two_entry_list_without_id() {
        let mut cursor =
            PlaybackCursor::new(&MediaDescriptor::new("https://host/x"), &CandidateOptions::default());
        assert_eq!(
            cursor.on_error(),
            PlaybackStatus::Retrying("https://host/x".into())
        );
        assert_eq!(cursor.on_error(), PlaybackStatus::Exhausted);
    }

    #[test]
    fn test_empty_list_is_exhausted() {
        let cursor = PlaybackCursor::from_candidates(Vec::new(), "https://host/x");
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.fallback_link(), Some("https://host/x"));
    }
}
