//! A thin logging front-end over a handler chain.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

use logchain_core::{Attr, Level, Record, Source};
use logchain_handler::{Enricher, EnricherOptions, Handler, JsonSink, Middleware};

use crate::error::Result;

/// Configuration for [`Logger::json`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    /// Enrichment options. `sumTime` is overridden by `time`.
    #[serde(flatten)]
    pub enricher: EnricherOptions,
    /// Initial chain value.
    pub seed: u16,
    /// Minimum enabled level.
    pub level: Level,
    /// Write the record time (and include it in checksums).
    pub time: bool,
    /// Attach the caller's file and line.
    pub source: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enricher: EnricherOptions::default(),
            seed: 0,
            level: Level::INFO,
            time: true,
            source: false,
        }
    }
}

/// Emits records into a handler chain.
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
    add_source: bool,
}

impl Logger {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            add_source: false,
        }
    }

    /// Build an enriched JSON-lines logger writing to `writer`.
    pub fn json<W: Write + Send + 'static>(writer: W, config: &LoggerConfig) -> Self {
        Self::json_with(writer, config, Vec::new())
    }

    /// Like [`Logger::json`], running `middleware` between enrichment and
    /// the sink.
    pub fn json_with<W: Write + Send + 'static>(
        writer: W,
        config: &LoggerConfig,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        let mut sink = JsonSink::new(writer).min_level(config.level);
        if !config.time {
            sink = sink.without_time();
        }
        let options = EnricherOptions {
            sum_time: config.time,
            ..config.enricher
        };
        let enricher = middleware
            .into_iter()
            .fold(
                Enricher::new(Arc::new(sink), options).with_seed(config.seed),
                Enricher::with_middleware,
            );
        Self {
            handler: Arc::new(enricher),
            add_source: config.source,
        }
    }

    /// The handler chain behind this logger.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Attach the caller's location to every record.
    pub fn with_source(mut self, enabled: bool) -> Self {
        self.add_source = enabled;
        self
    }

    /// Derive a logger adding `attrs` to every record.
    pub fn with(&self, attrs: Vec<Attr>) -> Self {
        Self {
            handler: self.handler.with_attrs(attrs),
            add_source: self.add_source,
        }
    }

    /// Derive a logger nesting attributes under `name`.
    pub fn with_group(&self, name: &str) -> Self {
        Self {
            handler: self.handler.with_group(name),
            add_source: self.add_source,
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Emit one record. Disabled levels are dropped silently.
    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let mut record = Record::new(level, msg).with_attrs(attrs);
        if self.add_source {
            record = record.with_source(Source::caller());
        }
        self.handler.handle(record)?;
        Ok(())
    }

    #[track_caller]
    pub fn flood(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::FLOOD, msg, attrs)
    }

    #[track_caller]
    pub fn trace(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::TRACE, msg, attrs)
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::DEBUG, msg, attrs)
    }

    #[track_caller]
    pub fn info(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::INFO, msg, attrs)
    }

    #[track_caller]
    pub fn notice(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::NOTICE, msg, attrs)
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::WARN, msg, attrs)
    }

    #[track_caller]
    pub fn error(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::ERROR, msg, attrs)
    }

    #[track_caller]
    pub fn crit(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::CRIT, msg, attrs)
    }

    #[track_caller]
    pub fn alert(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::ALERT, msg, attrs)
    }

    #[track_caller]
    pub fn emerg(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::EMERG, msg, attrs)
    }

    /// Logs at `FATAL` and returns; terminating is up to the caller.
    #[track_caller]
    pub fn fatal(&self, msg: &str, attrs: Vec<Attr>) -> Result<()> {
        self.log(Level::FATAL, msg, attrs)
    }
}
