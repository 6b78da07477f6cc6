//! Error types for the call client.

use callwheel_core::CoreError;
use callwheel_rounds::RoundError;
use thiserror::Error;

/// Errors that can occur while handling call events.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Fetching the latest round failed. Nothing was mutated.
    #[error("failed to fetch latest convo round: {0}")]
    RoundFetch(#[from] RoundError),

    /// The start round could not be computed.
    #[error("round sync error: {0}")]
    RoundSync(#[from] CoreError),

    /// Configuration is invalid.
    #[error("invalid config: {0}")]
    Config(String),

    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error belongs to the known-benign class that clients hide
    /// outside debug mode.
    pub fn is_benign(&self) -> bool {
        matches!(self, ClientError::RoundFetch(err) if err.is_benign())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
