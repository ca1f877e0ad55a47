//! # logchain handler
//!
//! Handler chain for logchain: the [`Enricher`] that stamps records with
//! identifiers and chained checksums, middleware, and the sinks records end
//! up in.
//!
//! ## Key Types
//!
//! - [`Handler`] - Interface of every node in a chain
//! - [`Enricher`] - Attaches `goroutine`, `logId` and `logSum`
//! - [`ChainState`] - Running checksum shared by a chain root and its derivations
//! - [`Middleware`] - Steps run after enrichment, before the sink
//! - [`JsonSink`] / [`MemorySink`] - Terminal handlers
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use logchain_core::{Level, Record};
//! use logchain_handler::{Enricher, EnricherOptions, Handler, MemorySink};
//!
//! let sink = MemorySink::new();
//! let options = EnricherOptions {
//!     log_id: true,
//!     add_sum: true,
//!     sum_chain: true,
//!     ..Default::default()
//! };
//! let handler = Enricher::new(Arc::new(sink.clone()), options);
//! handler.handle(Record::new(Level::INFO, "started")).unwrap();
//! assert_eq!(sink.len(), 1);
//! ```

pub mod chain;
pub mod enricher;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod options;
pub mod sink;

pub use chain::{ChainGuard, ChainState};
pub use enricher::{thread_number, Enricher};
pub use error::{HandlerError, Result};
pub use handler::Handler;
pub use middleware::{from_fn, Middleware, Next, Tee};
pub use options::EnricherOptions;
pub use sink::{JsonSink, MemorySink};
