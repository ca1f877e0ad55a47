//! Error types for logchain core.
//!
//! Checksum computation never fails. These errors only come from parsing the
//! textual forms that appear in serialized records and configuration.

use thiserror::Error;

/// Errors raised while parsing identifiers, timestamps and levels.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid log identifier {value:?}: {source}")]
    InvalidLogId {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid level: {0:?}")]
    InvalidLevel(String),
}
