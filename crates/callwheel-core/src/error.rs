//! Error types for callwheel core.

use thiserror::Error;

use crate::types::{Intent, Round};

/// Errors from round synchronization and key wheel operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The received intent is outside the syncer's intent space.
    #[error("invalid intent {intent}: syncer accepts intents below {intents}")]
    InvalidIntent { intent: Intent, intents: u32 },

    /// Computing the start round would overflow the round counter.
    #[error("round arithmetic overflows starting from round {0}")]
    RoundOverflow(Round),

    /// Syncer parameters cannot guarantee agreement.
    #[error("invalid round syncer parameters: {0}")]
    InvalidSyncerParams(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
