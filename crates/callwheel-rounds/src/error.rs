//! Error types for round sources.

use std::time::Duration;

use callwheel_core::Round;
use thiserror::Error;

/// Errors that can occur while fetching the latest round.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundError {
    /// The round service could not be reached or answered with an error.
    #[error("round service unavailable: {0}")]
    Unavailable(String),

    /// The service has no configuration for the requested round yet.
    ///
    /// Clients treat this as benign and usually hide it from the user.
    #[error("round {round} not configured")]
    NotConfigured { round: Round },

    /// The fetch did not complete in time.
    #[error("timed out after {0:?} waiting for latest round")]
    Timeout(Duration),
}

impl RoundError {
    /// Whether this error belongs to the known-benign class.
    pub fn is_benign(&self) -> bool {
        matches!(self, RoundError::NotConfigured { .. })
    }
}

/// Result type for round source operations.
pub type Result<T> = std::result::Result<T, RoundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message() {
        let err = RoundError::NotConfigured { round: Round(42) };
        assert_eq!(err.to_string(), "round 42 not configured");
        assert!(err.is_benign());
    }

    #[test]
    fn test_unavailable_not_benign() {
        assert!(!RoundError::Unavailable("connection refused".into()).is_benign());
        assert!(!RoundError::Timeout(Duration::from_secs(1)).is_benign());
    }
}
