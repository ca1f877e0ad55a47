//! Handler trait: the interface every node of a handler chain implements.

use std::sync::Arc;

use logchain_core::{Attr, Level, Record};

use crate::error::Result;

/// A node in a handler chain.
///
/// Handlers are immutable values. Deriving one with [`Handler::with_attrs`]
/// or [`Handler::with_group`] produces a new handler and leaves the original
/// untouched, so a handler can be shared freely across threads.
pub trait Handler: Send + Sync {
    /// Whether records at `level` would be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Handle one record.
    fn handle(&self, record: Record) -> Result<()>;

    /// Derive a handler that adds `attrs` to every record.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// Derive a handler that nests subsequent attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    fn handle(&self, record: Record) -> Result<()> {
        (**self).handle(record)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        (**self).with_attrs(attrs)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        (**self).with_group(name)
    }
}
