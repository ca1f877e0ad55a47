//! In-memory sink for tests.

use parking_lot::Mutex;
use std::sync::Arc;

use logchain_core::{Attr, Level, Record};

use super::Bound;
use crate::error::Result;
use crate::handler::Handler;

/// Captures records in memory.
///
/// Clones and derived handlers share the same storage, so a test can keep
/// the root and inspect what any derived handler produced.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
    bound: Bound,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record handled so far.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Remove and return every record handled so far.
    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Handler for MemorySink {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, mut record: Record) -> Result<()> {
        record.attrs = self.bound.assemble(record.attrs);
        self.records.lock().push(record);
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut next = self.clone();
        next.bound.add(attrs);
        Arc::new(next)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut next = self.clone();
        next.bound.open(name);
        Arc::new(next)
    }
}
