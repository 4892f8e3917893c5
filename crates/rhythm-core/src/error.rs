//! Core error types for rhythm-core.

use thiserror::Error;

/// Core error type for rhythm-core.
///
/// Stale alarm fires (a wake-up for a deleted or disabled reminder) are
/// deliberately *not* an error -- they are ignored by the scheduler.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The state store could not be read or written.
    #[error("State store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The state document could not be serialized or deserialized.
    #[error("State document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store holds no state document yet.
    #[error("No state document in store (engine not initialized)")]
    StoreEmpty,

    /// A reminder definition failed validation; prior armed state is
    /// left untouched.
    #[error("Invalid reminder definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    /// Failed to resolve the on-disk data directory.
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

impl EngineError {
    pub fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidDefinition {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for EngineError.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
