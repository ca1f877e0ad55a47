//! Proptest generators for property-based testing.
//!
//! The `wire_*` strategies only produce values whose JSON form reads back
//! to the same checksum input: finite floats, unique keys, no raw bytes and
//! no keys that collide with the fields the enricher or sink write.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use logchain_core::{Attr, ChecksumMode, Level, LogId, Record, Value};

/// Generate a level around the named ones.
pub fn level() -> impl Strategy<Value = Level> {
    (Level::TRACE.as_i32()..=Level::FATAL.as_i32()).prop_map(Level)
}

/// Generate a checksum mode.
pub fn mode() -> impl Strategy<Value = ChecksumMode> {
    prop_oneof![Just(ChecksumMode::Simple), Just(ChecksumMode::Full)]
}

/// Generate a random identifier.
pub fn log_id() -> impl Strategy<Value = LogId> {
    any::<[u8; 16]>().prop_map(LogId::from_bytes)
}

/// Generate an attribute key. Always contains `_`, so it never collides
/// with a built-in field.
pub fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,5}_[a-z0-9]{1,4}".prop_map(String::from)
}

/// Generate a message.
pub fn message() -> impl Strategy<Value = String> {
    "\\PC{0,24}".prop_map(String::from)
}

/// Generate a timestamp between 1970 and 2100 with nanosecond precision.
pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1_000_000_000)
        .prop_filter_map("timestamp out of range", |(secs, nanos)| {
            DateTime::from_timestamp(secs, nanos)
        })
}

/// Generate a scalar that survives a trip through JSON.
pub fn wire_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::I64),
        any::<u64>().prop_map(Value::U64),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::F64),
        "\\PC{0,16}".prop_map(Value::String),
        timestamp().prop_map(Value::Time),
    ]
}

/// Generate a possibly nested value that survives a trip through JSON.
pub fn wire_value() -> impl Strategy<Value = Value> {
    wire_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map(key(), inner.clone(), 0..4)
                .prop_map(|m| Value::Map(m.into_iter().collect())),
            prop::collection::btree_map(key(), inner, 0..4).prop_map(|m| {
                Value::Group(m.into_iter().map(|(k, v)| Attr::new(k, v)).collect())
            }),
        ]
    })
}

/// Generate attributes with distinct keys.
pub fn wire_attrs(max: usize) -> impl Strategy<Value = Vec<Attr>> {
    prop::collection::btree_map(key(), wire_value(), 0..=max)
        .prop_map(|m| m.into_iter().map(|(k, v)| Attr::new(k, v)).collect())
}

/// Generate a record timestamped now.
pub fn record() -> impl Strategy<Value = Record> {
    (level(), message(), wire_attrs(6))
        .prop_map(|(level, message, attrs)| Record::new(level, message).with_attrs(attrs))
}
