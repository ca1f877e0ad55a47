//! Error types for verification.

use thiserror::Error;

use logchain_core::CoreError;

use crate::verify::ChecksumResult;

/// Why a record could not be verified.
///
/// A checksum mismatch is not an error; see [`ChecksumResult::matches`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// `time` is a non-empty string that is not RFC 3339.
    #[error("can't parse timestamp: {0}")]
    InvalidTimestamp(#[source] CoreError),

    /// `msg` is present but not a string.
    #[error("msg is not a string: {0}")]
    MessageNotString(String),

    /// `logId` is a non-empty string that is not a UUID.
    #[error("can't parse logId: {0}")]
    InvalidLogId(#[source] CoreError),

    /// `logSum` is a non-empty string that is not a 16-bit hex number.
    #[error("can't parse logSum {value:?}: {source}")]
    InvalidLogSum {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Neither a non-nil `logId` nor a `logSum` is present.
    #[error("record carries neither logId nor logSum")]
    MissingEvidence,
}

/// A verification error together with whatever was extracted before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct VerifyFailure {
    #[source]
    pub error: VerifyError,
    pub partial: Box<ChecksumResult>,
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a stream of JSON objects.
    #[error("malformed JSON after record {after}: {source}")]
    Malformed {
        after: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for scans.
pub type Result<T> = std::result::Result<T, ScanError>;
