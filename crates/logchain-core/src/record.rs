//! Log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::Location;

use crate::level::Level;
use crate::value::{Attr, Value};

/// Where a record was emitted.
///
/// Serialized under the `source` key. Never part of any checksum.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Source {
    /// Capture the caller's file and line.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        Self {
            function: String::new(),
            file: loc.file().to_string(),
            line: loc.line(),
        }
    }
}

/// A single log record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
    pub source: Option<Source>,
}

impl Record {
    /// Create a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), level, message)
    }

    /// Create a record with an explicit timestamp.
    pub fn at(time: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            time,
            level,
            message: message.into(),
            attrs: Vec::new(),
            source: None,
        }
    }

    /// Append one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn add_attr(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    /// Look up the first attribute with `key` at the top level.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}
