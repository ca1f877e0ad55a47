//! JSON-lines sink.

use parking_lot::Mutex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::sync::Arc;

use logchain_core::time::format_wire;
use logchain_core::{scratch, Attr, Level, Record, Source, LEVEL_KEY, MSG_KEY, SOURCE_KEY, TIME_KEY};

use super::Bound;
use crate::error::Result;
use crate::handler::Handler;

/// Writes each record as one JSON object followed by `\n`.
///
/// Key order is `time`, `level`, `msg`, `source`, bound attributes, then
/// the record's attributes. Each line is written with a single `write_all`
/// under the writer lock, so concurrent records never interleave.
pub struct JsonSink<W> {
    writer: Arc<Mutex<W>>,
    min_level: Level,
    include_time: bool,
    bound: Bound,
}

impl<W> Clone for JsonSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
            min_level: self.min_level,
            include_time: self.include_time,
            bound: self.bound.clone(),
        }
    }
}

impl<W: Write + Send + 'static> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            min_level: Level::FLOOD,
            include_time: true,
            bound: Bound::default(),
        }
    }

    /// Only report records at or above `level` as enabled.
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Omit the `time` key.
    pub fn without_time(mut self) -> Self {
        self.include_time = false;
        self
    }

    /// Run `f` with the locked writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.writer.lock())
    }

    fn derive(&self, f: impl FnOnce(&mut Bound)) -> Self {
        let mut next = self.clone();
        f(&mut next.bound);
        next
    }
}

impl<W: Write + Send + 'static> Handler for JsonSink<W> {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: Record) -> Result<()> {
        let attrs = self.bound.assemble(record.attrs);
        let line = Line {
            time: self.include_time.then(|| format_wire(&record.time)),
            level: record.level.label(),
            msg: &record.message,
            source: record.source.as_ref(),
            attrs: &attrs,
        };

        let mut buf = scratch();
        serde_json::to_writer(&mut *buf, &line)?;
        buf.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.derive(|b| b.add(attrs)))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(self.derive(|b| b.open(name)))
    }
}

struct Line<'a> {
    time: Option<String>,
    level: String,
    msg: &'a str,
    source: Option<&'a Source>,
    attrs: &'a [Attr],
}

impl Serialize for Line<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(time) = &self.time {
            map.serialize_entry(TIME_KEY, time)?;
        }
        map.serialize_entry(LEVEL_KEY, &self.level)?;
        map.serialize_entry(MSG_KEY, self.msg)?;
        if let Some(source) = self.source {
            map.serialize_entry(SOURCE_KEY, source)?;
        }
        for attr in self.attrs {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}
