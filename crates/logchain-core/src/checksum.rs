//! Record checksums.
//!
//! A record folds into a 16-bit value with CRC-16/XMODEM in one of two modes.
//!
//! **Simple** concatenates a fixed subset of fields and hashes the buffer
//! once:
//!
//! ```text
//! carry ^ crc( time_millis? || level_label || msg || id[0..14]? )
//! ```
//!
//! **Full** hashes every attribute. Each `key = value` pair contributes
//! `crc(key) + crc(canonical(value))` (wrapping), and contributions are
//! combined with XOR, so the result does not depend on attribute order at any
//! nesting level:
//!
//! ```text
//! carry ^ field("time")? ^ field("level") ^ field("msg") ^ attrs... ^ field("logId")?
//! ```
//!
//! Groups, maps and lists XOR their members and then add `crc(key)`. List
//! elements are keyed by their decimal index.
//!
//! The carry-in is the previous record's checksum when chaining, which makes
//! every checksum depend on the whole history of the stream.

use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::buffer::scratch;
use crate::id::LogId;
use crate::record::Record;
use crate::time::{format_millis, format_nanos};
use crate::value::Value;

/// Key of the record timestamp.
pub const TIME_KEY: &str = "time";
/// Key of the record level.
pub const LEVEL_KEY: &str = "level";
/// Key of the record message.
pub const MSG_KEY: &str = "msg";
/// Key of the per-record identifier.
pub const ID_KEY: &str = "logId";
/// Key of the standalone checksum.
pub const SUM_KEY: &str = "logSum";
/// Key of the emitting thread number.
pub const THREAD_KEY: &str = "goroutine";
/// Key of the source location. Never hashed.
pub const SOURCE_KEY: &str = "source";

/// Canonical text of a null value.
pub const NULL_TEXT: &str = "<nil>";

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Checksum algorithm selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    /// Time, level label, message and identifier only; order-sensitive.
    #[default]
    Simple,
    /// Every attribute, recursively; order-independent.
    Full,
}

impl ChecksumMode {
    pub fn from_full(full: bool) -> Self {
        if full {
            Self::Full
        } else {
            Self::Simple
        }
    }

    pub fn is_full(self) -> bool {
        self == Self::Full
    }
}

/// CRC-16/XMODEM of `bytes`.
#[inline]
pub fn crc16(bytes: impl AsRef<[u8]>) -> u16 {
    CRC16.checksum(bytes.as_ref())
}

/// Contribution of one scalar `key = value` pair.
#[inline]
pub fn field(key: &str, value: impl AsRef<[u8]>) -> u16 {
    crc16(key).wrapping_add(crc16(value))
}

/// Contribution of the identifier in Full mode. Zero for the nil identifier.
pub fn id_checksum(id: &LogId) -> u16 {
    if id.is_nil() {
        0
    } else {
        field(ID_KEY, id.hashed_bytes())
    }
}

/// Checksum a record in the given mode.
pub fn checksum(mode: ChecksumMode, carry: u16, include_time: bool, record: &Record, id: &LogId) -> u16 {
    match mode {
        ChecksumMode::Simple => checksum_simple(carry, include_time, record, id),
        ChecksumMode::Full => checksum_full(carry, include_time, record, id),
    }
}

/// Simple-mode checksum. Attributes are ignored.
pub fn checksum_simple(carry: u16, include_time: bool, record: &Record, id: &LogId) -> u16 {
    let mut buf = scratch();
    if include_time {
        buf.extend_from_slice(format_millis(&record.time).as_bytes());
    }
    buf.extend_from_slice(record.level.label().as_bytes());
    buf.extend_from_slice(record.message.as_bytes());
    if !id.is_nil() {
        buf.extend_from_slice(id.hashed_bytes());
    }
    carry ^ crc16(buf.as_slice())
}

/// Full-mode checksum over every attribute of the record.
pub fn checksum_full(carry: u16, include_time: bool, record: &Record, id: &LogId) -> u16 {
    let mut sum = carry;
    if include_time {
        sum ^= field(TIME_KEY, format_millis(&record.time));
    }
    sum ^= field(LEVEL_KEY, record.level.as_i32().to_string());
    sum ^= field(MSG_KEY, &record.message);
    for attr in &record.attrs {
        sum ^= attr_checksum(&attr.key, &attr.value);
    }
    sum ^ id_checksum(id)
}

/// Full-mode contribution of one attribute, recursing into composites.
pub fn attr_checksum(key: &str, value: &Value) -> u16 {
    match value.resolved().as_ref() {
        Value::Group(attrs) => attrs
            .iter()
            .fold(0u16, |acc, a| acc ^ attr_checksum(&a.key, &a.value))
            .wrapping_add(crc16(key)),
        Value::Map(entries) => entries
            .iter()
            .fold(0u16, |acc, (k, v)| acc ^ attr_checksum(k, v))
            .wrapping_add(crc16(key)),
        Value::List(items) => items
            .iter()
            .enumerate()
            .fold(0u16, |acc, (i, v)| acc ^ attr_checksum(&i.to_string(), v))
            .wrapping_add(crc16(key)),
        scalar => field(key, canonical_scalar(scalar)),
    }
}

/// Full-mode contribution of one attribute as read back from JSON.
///
/// Agrees with [`attr_checksum`] for every value whose wire form preserves
/// its canonical text.
pub fn json_attr_checksum(key: &str, value: &serde_json::Value) -> u16 {
    use serde_json::Value as Json;
    match value {
        Json::Null => field(key, NULL_TEXT),
        Json::Bool(b) => field(key, bool_text(*b)),
        Json::Number(n) => {
            let text = if let Some(u) = n.as_u64() {
                u.to_string()
            } else if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                canonical_float(n.as_f64().unwrap_or(f64::NAN))
            };
            field(key, text)
        }
        Json::String(s) => field(key, s),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .fold(0u16, |acc, (i, v)| acc ^ json_attr_checksum(&i.to_string(), v))
            .wrapping_add(crc16(key)),
        Json::Object(map) => map
            .iter()
            .fold(0u16, |acc, (k, v)| acc ^ json_attr_checksum(k, v))
            .wrapping_add(crc16(key)),
    }
}

/// Canonical text of a float, matching how JSON encoders print numbers.
///
/// Plain notation for `1e-6 <= |x| < 1e21`, exponent notation with an
/// explicit sign otherwise (`1e+21`, `1e-7`). Non-finite values render as
/// `NaN`, `+Inf` and `-Inf`.
pub fn canonical_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let abs = f.abs();
    if abs == 0.0 || (1e-6..1e21).contains(&abs) {
        return format!("{f}");
    }
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn canonical_scalar(value: &Value) -> Cow<'_, [u8]> {
    let text = match value {
        Value::Null => NULL_TEXT.to_string(),
        Value::String(s) => return Cow::Borrowed(s.as_bytes()),
        Value::Bytes(b) => return Cow::Borrowed(b.as_ref()),
        Value::Bool(b) => bool_text(*b).to_string(),
        Value::I64(i) => i.to_string(),
        Value::U64(u) => u.to_string(),
        Value::F64(f) => canonical_float(*f),
        Value::Duration(d) => Value::duration_nanos(d).to_string(),
        Value::Time(t) => format_nanos(t),
        // Composites and deferred values are handled by the caller.
        Value::Group(_) | Value::Map(_) | Value::List(_) | Value::Lazy(_) => String::new(),
    };
    Cow::Owned(text.into_bytes())
}
