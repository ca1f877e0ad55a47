//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use logchain::{EnricherOptions, Logger, LoggerConfig};

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(String::from).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Logger config with identifiers and checksums.
pub fn config(full: bool, chain: bool, alone: bool) -> LoggerConfig {
    LoggerConfig {
        enricher: EnricherOptions {
            go_id: true,
            log_id: true,
            add_sum: true,
            sum_full: full,
            sum_chain: chain,
            sum_alone: alone,
            ..Default::default()
        },
        level: logchain::Level::TRACE,
        ..Default::default()
    }
}

pub fn logger(config: &LoggerConfig) -> (Logger, SharedBuf) {
    let buf = SharedBuf::default();
    (Logger::json(buf.clone(), config), buf)
}
