//! Error types for the logchain facade.

use logchain_core::CoreError;
use logchain_handler::HandlerError;
use logchain_verify::{ScanError, VerifyFailure};
use thiserror::Error;

/// Errors from any logchain component.
#[derive(Debug, Error)]
pub enum LogchainError {
    /// Parsing an identifier, timestamp or level failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A sink or middleware failed.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// A record could not be verified.
    #[error("verify error: {0}")]
    Verify(#[from] VerifyFailure),

    /// A log could not be scanned.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
}

/// Result type for logchain operations.
pub type Result<T> = std::result::Result<T, LogchainError>;
