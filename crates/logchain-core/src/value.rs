//! Attribute values.
//!
//! [`Value`] is the closed set of things a record attribute can hold. Every
//! variant has exactly one canonical textual form (see [`crate::checksum`]),
//! and the [`Serialize`] impl here writes each variant so that the verifier
//! reading the JSON back arrives at the same canonical form.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::checksum::canonical_float;
use crate::time::format_nanos;

/// Deferred values resolving to further deferred values are followed at most
/// this many times.
pub const MAX_LAZY_DEPTH: usize = 100;

const LAZY_TOO_DEEP: &str = "!LAZY: resolution exceeded depth limit";

/// An attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Duration(Duration),
    Time(DateTime<Utc>),
    Bytes(Bytes),
    /// Named ordered bundle of attributes.
    Group(Vec<Attr>),
    /// String-keyed entries, kept in insertion order.
    Map(Vec<(String, Value)>),
    List(Vec<Value>),
    Lazy(Lazy),
}

impl Value {
    /// Lower any [`Serialize`] type into a value tree.
    ///
    /// Serialization failures degrade to a string describing the error.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::from(json),
            Err(err) => Self::String(format!("!ERROR: {err}")),
        }
    }

    /// Stringify anything implementing [`fmt::Display`].
    pub fn display(value: impl fmt::Display) -> Self {
        Self::String(value.to_string())
    }

    /// Stringify an error.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::String(err.to_string())
    }

    /// Defer computing a value until it is first hashed or serialized.
    pub fn lazy(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::Lazy(Lazy::new(f))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// Follow deferred values until a concrete one is reached.
    pub fn resolved(&self) -> Cow<'_, Value> {
        let mut current = self;
        for _ in 0..MAX_LAZY_DEPTH {
            match current {
                Self::Lazy(lazy) => current = lazy.resolve(),
                other => return Cow::Borrowed(other),
            }
        }
        match current {
            Self::Lazy(_) => Cow::Owned(Self::String(LAZY_TOO_DEEP.to_string())),
            other => Cow::Borrowed(other),
        }
    }

    /// Copy with every deferred value, at any depth, unresolved again.
    pub fn fresh(&self) -> Self {
        match self {
            Self::Lazy(lazy) => Self::Lazy(lazy.fresh()),
            Self::Group(attrs) => Self::Group(attrs.iter().map(Attr::fresh).collect()),
            Self::Map(entries) => {
                Self::Map(entries.iter().map(|(k, v)| (k.clone(), v.fresh())).collect())
            }
            Self::List(items) => Self::List(items.iter().map(Value::fresh).collect()),
            other => other.clone(),
        }
    }

    /// Saturating nanosecond count of a duration.
    pub fn duration_nanos(d: &Duration) -> u64 {
        u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Deferred values
// ─────────────────────────────────────────────────────────────────────────────

type Resolver = Arc<dyn Fn() -> Value + Send + Sync>;

/// A value computed on first use and memoized.
///
/// Clones share the same cell, so the resolver runs at most once no matter
/// how many derived handlers or threads observe the value. [`Lazy::fresh`]
/// starts a new cell over the same resolver; handlers use it to resolve
/// bound values once per record.
#[derive(Clone)]
pub struct Lazy {
    resolver: Resolver,
    cell: Arc<OnceCell<Value>>,
}

impl Lazy {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            resolver: Arc::new(f),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Resolve one level, running the resolver if needed.
    pub fn resolve(&self) -> &Value {
        self.cell.get_or_init(|| (self.resolver)())
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// An unresolved copy sharing the resolver but not the result.
    pub fn fresh(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            cell: Arc::new(OnceCell::new()),
        }
    }
}

impl PartialEq for Lazy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => write!(f, "Lazy({value:?})"),
            None => f.write_str("Lazy(<pending>)"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// A key/value pair attached to a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A group attribute bundling `attrs` under `key`.
    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self {
            key: key.into(),
            value: Value::Group(attrs),
        }
    }

    /// An attribute whose value is computed on first use.
    ///
    /// Bound to a handler, the resolver runs again for every record.
    pub fn lazy(key: impl Into<String>, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            key: key.into(),
            value: Value::lazy(f),
        }
    }

    /// Copy with deferred values unresolved again. See [`Value::fresh`].
    pub fn fresh(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.fresh(),
        }
    }

    /// Whether this attribute holds a deferred value, at any depth.
    pub fn contains_lazy(&self) -> bool {
        fn walk(value: &Value) -> bool {
            match value {
                Value::Lazy(_) => true,
                Value::Group(attrs) => attrs.iter().any(|a| walk(&a.value)),
                Value::Map(entries) => entries.iter().any(|(_, v)| walk(v)),
                Value::List(items) => items.iter().any(walk),
                _ => false,
            }
        }
        walk(&self.value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lowering user types
// ─────────────────────────────────────────────────────────────────────────────

/// Conversion of user types into a [`Value`].
///
/// Implement this for domain types that should log as structured data
/// without going through serde.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }

            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64,
    isize => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64,
    usize => U64 as u64,
    f32 => F64 as f64,
    f64 => F64,
    Duration => Duration,
    DateTime<Utc> => Time,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Lazy> for Value {
    fn from(v: Lazy) -> Self {
        Value::Lazy(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::from(self)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::U64(u)
                } else if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire form
// ─────────────────────────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I64(i) => serializer.serialize_i64(*i),
            Value::U64(u) => serializer.serialize_u64(*u),
            // JSON has no NaN or infinity; write their canonical text instead.
            Value::F64(f) if !f.is_finite() => serializer.serialize_str(&canonical_float(*f)),
            Value::F64(f) => serializer.serialize_f64(*f),
            Value::Duration(d) => serializer.serialize_u64(Value::duration_nanos(d)),
            Value::Time(t) => serializer.serialize_str(&format_nanos(t)),
            Value::Bytes(b) => serializer.serialize_str(&hex::encode(b)),
            Value::Group(attrs) => AttrsRef(attrs).serialize(serializer),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Lazy(_) => self.resolved().as_ref().serialize(serializer),
        }
    }
}

/// Serializes a slice of attributes as one JSON object.
pub struct AttrsRef<'a>(pub &'a [Attr]);

impl Serialize for AttrsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for attr in self.0 {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}
