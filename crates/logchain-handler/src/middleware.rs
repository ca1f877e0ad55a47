//! Middleware: wrappers around the final `handle` of a chain.
//!
//! Middleware runs after enrichment, in registration order, and decides
//! whether (and with what record) to continue by calling [`Next::run`].

use std::sync::Arc;

use logchain_core::Record;

use crate::error::Result;
use crate::handler::Handler;

/// A step in the middleware chain.
pub trait Middleware: Send + Sync {
    fn handle(&self, record: Record, next: Next<'_>) -> Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(Record, Next<'_>) -> Result<()> + Send + Sync,
{
    fn handle(&self, record: Record, next: Next<'_>) -> Result<()> {
        self(record, next)
    }
}

/// Wrap a closure as shareable middleware.
pub fn from_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(Record, Next<'_>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The remainder of a middleware chain.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    sink: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Middleware>], sink: &'a dyn Handler) -> Self {
        Self { chain, sink }
    }

    /// Pass `record` to the next middleware, or to the sink at the end.
    pub fn run(self, record: Record) -> Result<()> {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(
                record,
                Next {
                    chain: rest,
                    sink: self.sink,
                },
            ),
            None => self.sink.handle(record),
        }
    }
}

/// Duplicates every record into a second handler before continuing.
///
/// Failures of the secondary handler are logged and otherwise ignored. A
/// secondary handler sharing the enclosing chain fails with
/// [`HandlerError::Reentrant`](crate::error::HandlerError::Reentrant) for
/// every record, since the chain lock is already held.
pub struct Tee {
    handler: Arc<dyn Handler>,
}

impl Tee {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

impl Middleware for Tee {
    fn handle(&self, record: Record, next: Next<'_>) -> Result<()> {
        if self.handler.enabled(record.level) {
            if let Err(err) = self.handler.handle(record.clone()) {
                tracing::warn!(error = %err, "tee handler failed");
            }
        }
        next.run(record)
    }
}
