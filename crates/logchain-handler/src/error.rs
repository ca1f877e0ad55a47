//! Error types for handlers.

use thiserror::Error;

/// Errors that can occur while handling a record.
///
/// Enrichment itself never fails; these come from sinks and middleware.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Writing to the underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the record failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The handling thread already holds the chain lock, typically because
    /// a deferred value or middleware logged through the same chain.
    #[error("chain lock already held by this thread")]
    Reentrant,

    /// A middleware refused to pass the record on.
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
