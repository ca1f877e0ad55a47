//! # logchain verify
//!
//! Offline verification of logchain records.
//!
//! ## Overview
//!
//! [`verify`] recomputes the checksum of one JSON record and extracts the
//! checksum it carries. [`ChainScanner`] replays a whole JSON-lines log,
//! tracking the chain value every record should follow and flagging records
//! that break it.
//!
//! ## Usage
//!
//! ```rust
//! use logchain_verify::{scan_reader, ScanOptions};
//!
//! let log = br#"{"level":"INFO","msg":"hello","logSum":"e57c"}"#;
//! let report = scan_reader(&log[..], ScanOptions::default()).unwrap();
//! assert!(report.is_clean());
//! ```

pub mod error;
pub mod scan;
pub mod verify;

pub use error::{Result, ScanError, VerifyError, VerifyFailure};
pub use scan::{scan_reader, ChainScanner, ScanOptions, ScanOutcome, ScanReport};
pub use verify::{verify, ChecksumResult, Verifier};
