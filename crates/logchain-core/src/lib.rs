//! # logchain core
//!
//! Pure primitives for logchain: records, attribute values, identifiers and
//! the checksum engine.
//!
//! This crate contains no I/O. Everything here is deterministic computation
//! over in-memory records.
//!
//! ## Key Types
//!
//! - [`Record`] - A log record: time, level, message, attributes
//! - [`Value`] / [`Attr`] - Closed set of attribute values
//! - [`LogId`] - Per-record UUIDv7 identifier, optionally carrying a checksum
//! - [`Level`] - Signed log level with canonical labels
//! - [`GroupFrames`] - Attribute groups opened by derived handlers
//!
//! ## Checksums
//!
//! Records fold into a 16-bit CRC in Simple or Full mode. See [`checksum`].

pub mod buffer;
pub mod checksum;
pub mod error;
pub mod frames;
pub mod id;
pub mod level;
pub mod record;
pub mod time;
pub mod value;

pub use buffer::{scratch, BufferPool, PooledBuffer};
pub use checksum::{
    attr_checksum, canonical_float, checksum, checksum_full, checksum_simple, crc16,
    json_attr_checksum, ChecksumMode, ID_KEY, LEVEL_KEY, MSG_KEY, SOURCE_KEY, SUM_KEY,
    THREAD_KEY, TIME_KEY,
};
pub use error::CoreError;
pub use frames::GroupFrames;
pub use id::LogId;
pub use level::Level;
pub use record::{Record, Source};
pub use value::{Attr, AttrsRef, Lazy, ToValue, Value};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
