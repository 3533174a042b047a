//! Error types for the media delivery pipeline

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the media delivery pipeline
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Fetch Errors
    // =========================================================================
    /// Generic fetch failure (transport level, or reported by a fetcher)
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Remote host answered with a non-success status
    #[error("Fetch of {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Fetch exceeded the configured timeout
    #[error("Fetch of {url} timed out after {timeout:?}")]
    FetchTimeout { url: String, timeout: Duration },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    /// A load state transition that the state machine does not allow
    #[error("Invalid load state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for every variant produced by a failed network retrieval.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. }
                | Error::HttpStatus { .. }
                | Error::HttpClient(_)
                | Error::FetchTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_classification() {
        let err = Error::HttpStatus {
            url: "https://cdn/a.jpg".into(),
            status: 404,
        };
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("404"));

        let err = Error::Config("bad".into());
        assert!(!err.is_fetch_failure());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = Error::InvalidTransition {
            from: "Idle".into(),
            to: "Loaded".into(),
        };
        assert_eq!(err.to_string(), "Invalid load state transition: Idle -> Loaded");
    }
}
