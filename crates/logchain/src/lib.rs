//! # logchain
//!
//! Structured logging where every record carries an identifier and a
//! checksum chained from the record before it. A consumer of the JSON log
//! can detect modified, dropped, duplicated or reordered records without
//! any transport-level integrity layer.
//!
//! ## Overview
//!
//! - **Checksums**: CRC-16 over a fixed field subset (Simple) or over every
//!   attribute, order-independently (Full)
//! - **Enrichment**: `goroutine`, `logId` and `logSum` attached by the
//!   [`Enricher`] in front of any sink
//! - **Verification**: [`verify`] for single records, [`ChainScanner`] for
//!   whole logs, and the `logscan` command line
//!
//! CRC-16 detects corruption and ordering faults. It is not a cryptographic
//! integrity guarantee.
//!
//! ## Usage
//!
//! ```rust
//! use logchain::{Attr, Logger, LoggerConfig, EnricherOptions};
//!
//! let config = LoggerConfig {
//!     enricher: EnricherOptions {
//!         log_id: true,
//!         add_sum: true,
//!         sum_chain: true,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let logger = Logger::json(std::io::sink(), &config);
//! logger.info("user signed in", vec![Attr::new("user", "ana")]).unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `logchain::core` - Records, values, identifiers, checksum engine
//! - `logchain::handler` - Enricher, middleware, sinks
//! - `logchain::verify` - Verifier and chain scanner

pub mod cli;
pub mod error;
pub mod logger;

// Re-export component crates
pub use logchain_core as core;
pub use logchain_handler as handler;
pub use logchain_verify as verify;

// Re-export main types for convenience
pub use error::{LogchainError, Result};
pub use logger::{Logger, LoggerConfig};

pub use logchain_core::{
    checksum, Attr, ChecksumMode, Lazy, Level, LogId, Record, Source, ToValue, Value,
};
pub use logchain_handler::{
    ChainState, Enricher, EnricherOptions, Handler, JsonSink, MemorySink, Middleware, Next,
};
pub use logchain_verify::verify::verify;
pub use logchain_verify::{
    scan_reader, ChainScanner, ChecksumResult, ScanOptions, ScanOutcome, ScanReport, Verifier,
};
