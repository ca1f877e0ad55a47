//! The record enricher.
//!
//! [`Enricher`] wraps a sink and attaches to every record, depending on its
//! [`EnricherOptions`]:
//!
//! - `goroutine`: number of the emitting thread
//! - `logId`: a fresh UUIDv7, optionally carrying the checksum in its last
//!   two bytes
//! - `logSum`: the checksum as four lower-case hex digits
//!
//! The checksum of each record is XORed with the chain value. With chaining
//! enabled the result becomes the new chain value, so every record's checksum
//! depends on all records before it. The chain lock is then held until the
//! sink has accepted the record: records reach the sink in exactly the order
//! the chain advanced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use logchain_core::{
    attr_checksum, checksum, Attr, GroupFrames, Level, LogId, Record, ID_KEY, SUM_KEY, THREAD_KEY,
};

use crate::chain::{ChainGuard, ChainState};
use crate::error::Result;
use crate::handler::Handler;
use crate::middleware::{Middleware, Next};
use crate::options::EnricherOptions;

/// Handler chain node attaching identifiers and chained checksums.
#[derive(Clone)]
pub struct Enricher {
    inner: Arc<dyn Handler>,
    options: EnricherOptions,
    chain: Arc<ChainState>,
    /// Full-mode contribution of attributes already bound to `inner`.
    with_sum: u16,
    /// Attributes held back from `inner` because they contain deferred values
    /// or follow such attributes.
    pending: Vec<Attr>,
    frames: GroupFrames,
    middleware: Arc<[Arc<dyn Middleware>]>,
}

impl Enricher {
    /// Wrap `inner`, starting a new chain from zero.
    pub fn new(inner: Arc<dyn Handler>, options: EnricherOptions) -> Self {
        Self {
            inner,
            options,
            chain: Arc::new(ChainState::new(0)),
            with_sum: 0,
            pending: Vec::new(),
            frames: GroupFrames::new(),
            middleware: Arc::from(Vec::new()),
        }
    }

    /// Start the chain from `seed` instead of zero.
    ///
    /// The seed is XORed into every checksum even when chaining is off.
    pub fn with_seed(mut self, seed: u16) -> Self {
        self.chain = Arc::new(ChainState::new(seed));
        self
    }

    /// Share an existing chain with another root.
    pub fn with_chain(mut self, chain: Arc<ChainState>) -> Self {
        self.chain = chain;
        self
    }

    /// Append middleware run after enrichment, before the sink.
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        let mut chain = self.middleware.to_vec();
        chain.push(middleware);
        self.middleware = Arc::from(chain);
        self
    }

    pub fn options(&self) -> &EnricherOptions {
        &self.options
    }

    /// The chain shared by this node and everything derived from it.
    pub fn chain(&self) -> &Arc<ChainState> {
        &self.chain
    }

    /// Derive a node binding `attrs` to every record.
    pub fn derive_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut next = self.clone();
        if attrs.is_empty() {
            return next;
        }

        let deferred = attrs.iter().any(Attr::contains_lazy);
        if self.frames.is_empty() && self.pending.is_empty() && !deferred {
            if self.options.sum_full {
                for attr in &attrs {
                    next.with_sum ^= attr_checksum(&attr.key, &attr.value);
                }
            }
            next.inner = self.inner.with_attrs(attrs);
            return next;
        }

        if let Err(attrs) = next.frames.append(attrs) {
            next.pending.extend(attrs);
        }
        next
    }

    /// Derive a node nesting subsequent attributes under `name`.
    pub fn derive_group(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !name.is_empty() {
            next.frames.open(name);
        }
        next
    }

    /// Rebuild the record with pending and grouped attributes in place.
    fn flatten(&self, mut record: Record) -> Record {
        if self.frames.is_empty() && self.pending.is_empty() {
            return record;
        }
        let own = std::mem::take(&mut record.attrs);
        let mut attrs = Vec::with_capacity(self.pending.len() + own.len());
        attrs.extend(self.pending.iter().map(Attr::fresh));
        if self.frames.is_empty() {
            attrs.extend(own);
        } else if let Some(group) = self.frames.nest(own) {
            attrs.push(group);
        }
        record.attrs = attrs;
        record
    }

    /// Attach thread number, identifier and checksum.
    ///
    /// `guard` is present exactly when chaining is enabled.
    fn enrich(&self, mut record: Record, guard: Option<&mut ChainGuard<'_>>) -> Record {
        let opts = &self.options;
        if opts.go_id {
            record.add_attr(Attr::new(THREAD_KEY, thread_number()));
        }
        if !opts.log_id && !opts.add_sum {
            return record;
        }

        let id = if opts.log_id {
            LogId::generate()
        } else {
            LogId::NIL
        };
        if !opts.add_sum {
            record.add_attr(Attr::new(ID_KEY, id.to_string()));
            return record;
        }

        let own = checksum(opts.mode(), self.with_sum, opts.sum_time, &record, &id);
        let sum = match guard {
            Some(guard) => {
                let sum = guard.value() ^ own;
                guard.advance(sum);
                sum
            }
            None => self.chain.current() ^ own,
        };

        if !opts.log_id {
            record.add_attr(Attr::new(SUM_KEY, format!("{sum:04x}")));
        } else if opts.sum_alone {
            record.add_attr(Attr::new(ID_KEY, id.to_string()));
            record.add_attr(Attr::new(SUM_KEY, format!("{sum:04x}")));
        } else {
            record.add_attr(Attr::new(ID_KEY, id.with_checksum(sum).to_string()));
        }
        record
    }
}

impl Handler for Enricher {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    /// The chain lock is not reentrant. Logging through a handler of the
    /// same chain from a deferred value, middleware or sink fails with
    /// [`HandlerError::Reentrant`](crate::error::HandlerError::Reentrant).
    fn handle(&self, record: Record) -> Result<()> {
        // Held until the sink returns so sink order equals chain order.
        let mut guard = if self.options.sum_chain {
            Some(self.chain.lock()?)
        } else {
            None
        };
        let record = self.flatten(record);
        let record = self.enrich(record, guard.as_mut());
        Next::new(&self.middleware, self.inner.as_ref()).run(record)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.derive_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(self.derive_group(name))
    }
}

/// Small per-process number of the calling thread, starting at 1.
pub fn thread_number() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static NUMBER: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    NUMBER.with(|n| *n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use logchain_core::{checksum_full, checksum_simple, ChecksumMode, Value};

    fn options() -> EnricherOptions {
        EnricherOptions {
            log_id: true,
            add_sum: true,
            sum_time: true,
            ..Default::default()
        }
    }

    fn enricher(sink: &MemorySink, options: EnricherOptions) -> Enricher {
        Enricher::new(Arc::new(sink.clone()), options)
    }

    fn id_of(record: &Record) -> LogId {
        let text = record.attr(ID_KEY).and_then(Value::as_str).unwrap();
        LogId::parse(text).unwrap()
    }

    fn sum_of(record: &Record) -> u16 {
        let text = record.attr(SUM_KEY).and_then(Value::as_str).unwrap();
        u16::from_str_radix(text, 16).unwrap()
    }

    /// Record as the checksum saw it: without the attributes added after.
    fn hashed_view(record: &Record) -> Record {
        let mut view = record.clone();
        view.attrs.retain(|a| a.key != ID_KEY && a.key != SUM_KEY);
        view
    }

    #[test]
    fn test_packed_checksum() {
        let sink = MemorySink::new();
        enricher(&sink, options())
            .handle(Record::new(Level::INFO, "hello"))
            .unwrap();

        let record = &sink.records()[0];
        assert!(record.attr(SUM_KEY).is_none());
        let id = id_of(record);
        let expected = checksum_simple(0, true, record, &id);
        assert_eq!(id.embedded_checksum(), expected);
    }

    #[test]
    fn test_alone_mode() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            sum_alone: true,
            ..options()
        };
        enricher(&sink, opts)
            .handle(Record::new(Level::WARN, "x"))
            .unwrap();

        let record = &sink.records()[0];
        let id = id_of(record);
        let text = record.attr(SUM_KEY).and_then(Value::as_str).unwrap();
        assert_eq!(text.len(), 4);
        assert_eq!(sum_of(record), checksum_simple(0, true, record, &id));
    }

    #[test]
    fn test_sum_only_uses_nil_id() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            ..options()
        };
        enricher(&sink, opts)
            .handle(Record::new(Level::INFO, "no id"))
            .unwrap();

        let record = &sink.records()[0];
        assert!(record.attr(ID_KEY).is_none());
        assert_eq!(sum_of(record), checksum_simple(0, true, record, &LogId::NIL));
    }

    #[test]
    fn test_id_only() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: true,
            ..Default::default()
        };
        enricher(&sink, opts)
            .handle(Record::new(Level::INFO, "id"))
            .unwrap();
        let record = &sink.records()[0];
        assert!(!id_of(record).is_nil());
        assert!(record.attr(SUM_KEY).is_none());
    }

    #[test]
    fn test_nothing_enabled_passes_through() {
        let sink = MemorySink::new();
        let record = Record::new(Level::INFO, "plain").with_attr("k", 1u64);
        enricher(&sink, EnricherOptions::default())
            .handle(record.clone())
            .unwrap();
        assert_eq!(sink.records(), vec![record]);
    }

    #[test]
    fn test_seed_applies_without_chain() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            ..options()
        };
        let handler = enricher(&sink, opts).with_seed(0x5A5A);
        handler.handle(Record::new(Level::INFO, "a")).unwrap();
        handler.handle(Record::new(Level::INFO, "a")).unwrap();

        for record in sink.records() {
            let own = checksum_simple(0, true, &hashed_view(&record), &LogId::NIL);
            assert_eq!(sum_of(&record), own ^ 0x5A5A);
        }
        assert_eq!(handler.chain().current(), 0x5A5A);
    }

    #[test]
    fn test_chain_advances() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            sum_chain: true,
            ..options()
        };
        let handler = enricher(&sink, opts).with_seed(7);
        for msg in ["one", "two", "three"] {
            handler.handle(Record::new(Level::INFO, msg)).unwrap();
        }

        let mut carry = 7;
        for record in sink.records() {
            let own = checksum_simple(0, true, &hashed_view(&record), &LogId::NIL);
            assert_eq!(sum_of(&record), carry ^ own);
            carry = sum_of(&record);
        }
        assert_eq!(handler.chain().current(), carry);
    }

    #[test]
    fn test_thread_attr_hashed_in_full_mode() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            go_id: true,
            sum_full: true,
            sum_alone: true,
            ..options()
        };
        enricher(&sink, opts)
            .handle(Record::new(Level::INFO, "t"))
            .unwrap();

        let record = &sink.records()[0];
        assert_eq!(record.attr(THREAD_KEY), Some(&Value::U64(thread_number())));
        let id = id_of(record);
        let view = hashed_view(record);
        assert_eq!(sum_of(record), checksum_full(0, true, &view, &id));
    }

    #[test]
    fn test_bound_attrs_counted_in_full_mode() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            sum_full: true,
            ..options()
        };
        let handler = enricher(&sink, opts).derive_attrs(vec![Attr::new("app", "svc")]);
        handler.handle(Record::new(Level::INFO, "m")).unwrap();

        // The sink saw the bound attribute; the checksum covers it too.
        let record = &sink.records()[0];
        assert_eq!(record.attr("app").and_then(Value::as_str), Some("svc"));
        let view = hashed_view(record);
        assert_eq!(sum_of(record), checksum_full(0, true, &view, &LogId::NIL));
    }

    #[test]
    fn test_groups_flattened_like_eager_nesting() {
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            sum_full: true,
            ..options()
        };
        let handler = enricher(&sink, opts)
            .derive_group("req")
            .derive_attrs(vec![Attr::new("id", 3u64)])
            .derive_group("db");
        handler
            .handle(Record::new(Level::INFO, "q").with_attr("rows", 2u64))
            .unwrap();

        let record = &sink.records()[0];
        let expected = Attr::group(
            "req",
            vec![
                Attr::new("id", 3u64),
                Attr::group("db", vec![Attr::new("rows", 2u64)]),
            ],
        );
        assert_eq!(record.attrs[0], expected);
        let view = hashed_view(record);
        assert_eq!(
            sum_of(record),
            checksum(ChecksumMode::Full, 0, true, &view, &LogId::NIL)
        );
    }

    #[test]
    fn test_lazy_attrs_resolved_once_per_record() {
        use std::sync::atomic::AtomicU64;

        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            log_id: false,
            sum_full: true,
            ..options()
        };
        let handler = enricher(&sink, opts)
            .derive_attrs(vec![Attr::lazy("seq", move || {
                Value::from(counter.fetch_add(1, Ordering::SeqCst))
            })])
            .derive_attrs(vec![Attr::new("after", true)]);
        assert_eq!(handler.pending.len(), 2);

        for msg in ["a", "b", "c"] {
            handler.handle(Record::new(Level::INFO, msg)).unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let records = sink.records();
        let seen: Vec<Value> = records
            .iter()
            .map(|r| r.attrs[0].value.resolved().into_owned())
            .collect();
        assert_eq!(seen, vec![Value::U64(0), Value::U64(1), Value::U64(2)]);
        for record in &records {
            assert_eq!(record.attrs[0].key, "seq");
            assert_eq!(record.attrs[1].key, "after");
            let view = hashed_view(record);
            assert_eq!(sum_of(record), checksum_full(0, true, &view, &LogId::NIL));
        }
        // Sums were taken over the same resolution the sink received.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_logging_from_lazy_on_same_chain_errors() {
        use std::sync::OnceLock;

        let slot: Arc<OnceLock<Enricher>> = Arc::new(OnceLock::new());
        let inner = slot.clone();
        let sink = MemorySink::new();
        let opts = EnricherOptions {
            sum_chain: true,
            sum_full: true,
            ..options()
        };
        let handler = enricher(&sink, opts).derive_attrs(vec![Attr::lazy("nested", move || {
            match inner.get().map(|h| h.handle(Record::new(Level::INFO, "inner"))) {
                Some(Err(err)) => Value::from(err.to_string()),
                _ => Value::from("logged"),
            }
        })]);
        assert!(slot.set(handler.clone()).is_ok());

        handler.handle(Record::new(Level::INFO, "outer")).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].attrs[0].value.resolved().as_ref(),
            &Value::from("chain lock already held by this thread")
        );
        // The lock was released, so the chain keeps working.
        handler.handle(Record::new(Level::INFO, "again")).unwrap();
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn test_empty_group_is_noop() {
        let sink = MemorySink::new();
        let handler = enricher(&sink, options()).derive_group("");
        assert!(handler.frames.is_empty());
    }
}
