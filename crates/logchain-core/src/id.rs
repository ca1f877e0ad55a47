//! Per-record identifiers.
//!
//! A [`LogId`] is a UUIDv7: the leading 48 bits are a millisecond timestamp,
//! so identifiers generated in one process sort in emission order. The last
//! two bytes can carry a record checksum, which lets a single `logId` field
//! both identify a record and prove its integrity.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Number of identifier bytes covered by checksums.
///
/// Bytes 14 and 15 are reserved for the embedded checksum.
pub const ID_HASHED_LEN: usize = 14;

/// A 128-bit record identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogId(Uuid);

impl LogId {
    /// The absent identifier.
    pub const NIL: Self = Self(Uuid::nil());

    /// Generate a fresh, monotonically non-decreasing identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// The bytes that participate in checksums.
    pub fn hashed_bytes(&self) -> &[u8] {
        &self.as_bytes()[..ID_HASHED_LEN]
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Return a copy with `sum` packed big-endian into bytes 14 and 15.
    pub fn with_checksum(self, sum: u16) -> Self {
        let mut bytes = *self.as_bytes();
        bytes[ID_HASHED_LEN..].copy_from_slice(&sum.to_be_bytes());
        Self::from_bytes(bytes)
    }

    /// Read the checksum carried in bytes 14 and 15.
    pub fn embedded_checksum(&self) -> u16 {
        let bytes = self.as_bytes();
        u16::from_be_bytes([bytes[14], bytes[15]])
    }

    /// Parse the 36-character hyphenated form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|source| CoreError::InvalidLogId {
                value: s.to_string(),
                source,
            })
    }
}

impl fmt::Debug for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogId({})", self.0.hyphenated())
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for LogId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for LogId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<LogId> for Uuid {
    fn from(id: LogId) -> Self {
        id.0
    }
}
