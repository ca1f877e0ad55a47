//! Recomputing the checksum of a serialized record.
//!
//! The verifier re-parses one JSON record, rebuilds the checksum input the
//! enricher saw and extracts the checksum the record carries (`logSum`, or
//! the last two bytes of `logId`). Comparing the two, together with the
//! chain value, is left to the caller.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use logchain_core::checksum::field;
use logchain_core::time::{format_millis, parse_rfc3339};
use logchain_core::{
    crc16, json_attr_checksum, scratch, ChecksumMode, Level, LogId, ID_KEY, LEVEL_KEY, MSG_KEY,
    SOURCE_KEY, SUM_KEY, THREAD_KEY, TIME_KEY,
};

use crate::error::{VerifyError, VerifyFailure};

/// Everything extracted from one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChecksumResult {
    pub time: Option<DateTime<Utc>>,
    pub level: Level,
    /// Raw `source` object, if any.
    pub source: Map<String, Json>,
    pub message: String,
    /// Emitting thread number (`goroutine`), if any.
    pub thread: Option<u64>,
    pub log_id: LogId,
    /// Checksum carried by the record.
    pub log_sum: u16,
    /// Checksum recomputed from the record, before chaining.
    pub sum: u16,
}

impl ChecksumResult {
    /// Whether the record verifies against the chain value it follows.
    pub fn matches(&self, chain: u16) -> bool {
        self.sum ^ chain == self.log_sum
    }

    /// Render `source` as `file:function():line`.
    pub fn source_to_string(&self) -> String {
        let mut out = String::new();
        if let Some(Json::String(file)) = self.source.get("file") {
            out.push_str(file);
            out.push(':');
        }
        if let Some(Json::String(function)) = self.source.get("function") {
            out.push_str(function);
            out.push_str("():");
        }
        match self.source.get("line") {
            Some(Json::Number(n)) => out.push_str(&n.to_string()),
            Some(Json::String(s)) => out.push_str(s),
            _ => {}
        }
        out
    }
}

/// Verifies records in a fixed checksum mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct Verifier {
    mode: ChecksumMode,
}

impl Verifier {
    pub fn new(mode: ChecksumMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ChecksumMode {
        self.mode
    }

    /// Recompute the checksum of `record` and extract its evidence.
    pub fn verify(&self, record: &Map<String, Json>) -> Result<ChecksumResult, VerifyFailure> {
        let mut res = ChecksumResult::default();
        let outcome = match self.mode {
            ChecksumMode::Simple => verify_simple(record, &mut res),
            ChecksumMode::Full => verify_full(record, &mut res),
        };
        match outcome {
            Ok(()) => Ok(res),
            Err(error) => Err(VerifyFailure {
                error,
                partial: Box::new(res),
            }),
        }
    }
}

/// Shorthand for `Verifier::new(mode).verify(record)`.
pub fn verify(
    mode: ChecksumMode,
    record: &Map<String, Json>,
) -> Result<ChecksumResult, VerifyFailure> {
    Verifier::new(mode).verify(record)
}

fn non_empty_str(value: Option<&Json>) -> Option<&str> {
    match value {
        Some(Json::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn parse_time(text: &str, res: &mut ChecksumResult) -> Result<String, VerifyError> {
    let time = parse_rfc3339(text).map_err(VerifyError::InvalidTimestamp)?;
    res.time = Some(time);
    Ok(format_millis(&time))
}

fn parse_id(text: &str, res: &mut ChecksumResult) -> Result<LogId, VerifyError> {
    let id = LogId::parse(text).map_err(VerifyError::InvalidLogId)?;
    res.log_id = id;
    Ok(id)
}

fn message_error(value: &Json, res: &mut ChecksumResult) -> VerifyError {
    res.message = value.to_string();
    let kind = match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    VerifyError::MessageNotString(kind.to_string())
}

fn capture_context(record: &Map<String, Json>, res: &mut ChecksumResult) {
    if let Some(Json::Object(source)) = record.get(SOURCE_KEY) {
        res.source = source.clone();
    }
    if let Some(Json::Number(n)) = record.get(THREAD_KEY) {
        res.thread = n.as_u64().or_else(|| n.as_f64().map(|f| f as u64));
    }
}

fn verify_simple(record: &Map<String, Json>, res: &mut ChecksumResult) -> Result<(), VerifyError> {
    capture_context(record, res);
    let mut buf = scratch();

    if let Some(text) = non_empty_str(record.get(TIME_KEY)) {
        buf.extend_from_slice(parse_time(text, res)?.as_bytes());
    }
    if let Some(label) = non_empty_str(record.get(LEVEL_KEY)) {
        res.level = Level::from_label(label);
        buf.extend_from_slice(res.level.label().as_bytes());
    }
    match record.get(MSG_KEY) {
        Some(Json::String(msg)) => {
            res.message = msg.clone();
            buf.extend_from_slice(msg.as_bytes());
        }
        Some(other) => return Err(message_error(other, res)),
        None => {}
    }
    if let Some(text) = non_empty_str(record.get(ID_KEY)) {
        let id = parse_id(text, res)?;
        buf.extend_from_slice(id.hashed_bytes());
    }

    res.sum = crc16(buf.as_slice());
    finish(non_empty_str(record.get(SUM_KEY)), res)
}

fn verify_full(record: &Map<String, Json>, res: &mut ChecksumResult) -> Result<(), VerifyError> {
    capture_context(record, res);
    let mut log_sum = None;

    for (key, value) in record {
        let consumed = match (key.as_str(), value) {
            (TIME_KEY, Json::String(text)) if !text.is_empty() => {
                let millis = parse_time(text, res)?;
                res.sum ^= field(TIME_KEY, millis);
                true
            }
            (LEVEL_KEY, Json::String(label)) if !label.is_empty() => {
                let level = Level::from_label(label);
                res.level = level;
                res.sum ^= field(LEVEL_KEY, level.as_i32().to_string());
                true
            }
            (MSG_KEY, Json::String(msg)) => {
                res.message = msg.clone();
                res.sum ^= field(MSG_KEY, msg);
                true
            }
            (MSG_KEY, other) => return Err(message_error(other, res)),
            (ID_KEY, Json::String(text)) if !text.is_empty() => {
                let id = parse_id(text, res)?;
                let contribution = field(ID_KEY, id.hashed_bytes());
                res.sum ^= contribution;
                true
            }
            (SUM_KEY, Json::String(text)) if !text.is_empty() => {
                log_sum = Some(text.as_str());
                true
            }
            (SOURCE_KEY, _) => true,
            _ => false,
        };
        if !consumed {
            res.sum ^= json_attr_checksum(key, value);
        }
    }

    finish(log_sum, res)
}

fn finish(log_sum: Option<&str>, res: &mut ChecksumResult) -> Result<(), VerifyError> {
    res.log_sum = match log_sum {
        Some(text) => {
            u16::from_str_radix(text, 16).map_err(|source| VerifyError::InvalidLogSum {
                value: text.to_string(),
                source,
            })?
        }
        None if res.log_id.is_nil() => return Err(VerifyError::MissingEvidence),
        None => res.log_id.embedded_checksum(),
    };
    Ok(())
}
