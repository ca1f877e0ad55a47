//! Test fixtures and helpers.
//!
//! [`LogFixture`] wires an [`Enricher`] in front of an in-memory JSON sink,
//! so a test can emit records and then verify exactly the bytes a file
//! would have received.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{Map, Value as Json};
use std::sync::Arc;

use logchain_core::Record;
use logchain_handler::{Enricher, EnricherOptions, Handler, JsonSink};
use logchain_verify::{scan_reader, ScanOptions, ScanReport};

/// An enriched JSON log held in memory.
pub struct LogFixture {
    sink: JsonSink<Vec<u8>>,
    enricher: Enricher,
    seed: u16,
}

impl LogFixture {
    /// Create a fixture chaining from zero.
    pub fn new(options: EnricherOptions) -> Self {
        Self::with_seed(options, 0)
    }

    /// Create a fixture chaining from `seed`.
    pub fn with_seed(options: EnricherOptions, seed: u16) -> Self {
        let mut sink = JsonSink::new(Vec::new());
        if !options.sum_time {
            sink = sink.without_time();
        }
        let enricher = Enricher::new(Arc::new(sink.clone()), options).with_seed(seed);
        Self {
            sink,
            enricher,
            seed,
        }
    }

    /// Root handler. Derived handlers share the chain and the output.
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::new(self.enricher.clone())
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Emit `record` through the root handler.
    pub fn emit(&self, record: Record) -> logchain_handler::Result<()> {
        self.enricher.handle(record)
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.sink
            .with_writer(|buf| String::from_utf8_lossy(buf).into_owned())
    }

    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(String::from).collect()
    }

    /// Written records, parsed back.
    pub fn records(&self) -> Vec<Map<String, Json>> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Scan options matching how this fixture enriches.
    pub fn scan_options(&self) -> ScanOptions {
        let options = self.enricher.options();
        ScanOptions {
            mode: options.mode(),
            chain: options.sum_chain,
            seed: self.seed,
            resync: true,
        }
    }

    /// Scan the output as written.
    pub fn scan(&self) -> logchain_verify::Result<ScanReport> {
        scan_lines(&self.lines(), self.scan_options())
    }
}

/// Options enabling identifiers and chained checksums.
pub fn chained_options(full: bool) -> EnricherOptions {
    EnricherOptions {
        log_id: true,
        add_sum: true,
        sum_full: full,
        sum_time: true,
        sum_chain: true,
        ..Default::default()
    }
}

/// Scan `lines` as one log.
pub fn scan_lines(
    lines: &[String],
    options: ScanOptions,
) -> logchain_verify::Result<ScanReport> {
    let log = lines.join("\n");
    scan_reader(log.as_bytes(), options)
}

/// Shuffle `lines` deterministically.
pub fn shuffle_lines(lines: &[String], seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = lines.to_vec();
    shuffled.shuffle(&mut rng);
    shuffled
}

/// Replace `key` in a JSON line, keeping everything else.
pub fn tamper(line: &str, key: &str, value: Json) -> String {
    match serde_json::from_str::<Map<String, Json>>(line) {
        Ok(mut record) => {
            record.insert(key.to_string(), value);
            Json::Object(record).to_string()
        }
        Err(_) => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logchain_core::{Attr, Level};
    use logchain_verify::ScanError;
    use serde_json::json;

    fn emit_all(fixture: &LogFixture, count: usize) {
        for i in 0..count {
            let record = Record::new(Level::INFO, format!("record {i}"))
                .with_attrs(vec![Attr::new("seq_no", i)]);
            fixture.emit(record).unwrap();
        }
    }

    #[test]
    fn test_fixture_scans_clean() {
        for full in [false, true] {
            let fixture = LogFixture::new(chained_options(full));
            emit_all(&fixture, 5);
            let report = fixture.scan().unwrap();
            assert_eq!(report.records, 5);
            assert!(report.is_clean(), "full={full}: {report:?}");
        }
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let lines: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(shuffle_lines(&lines, 7), shuffle_lines(&lines, 7));
        assert_ne!(shuffle_lines(&lines, 7), lines);
    }

    #[test]
    fn test_tamper_detected() {
        let fixture = LogFixture::new(chained_options(true));
        emit_all(&fixture, 3);
        let mut lines = fixture.lines();
        lines[1] = tamper(&lines[1], "seq_no", json!(99));
        let report = scan_lines(&lines, fixture.scan_options()).unwrap();
        assert_eq!(report.anomalies, 1);
    }

    #[test]
    fn test_malformed_lines_are_an_error() {
        let fixture = LogFixture::new(chained_options(false));
        emit_all(&fixture, 2);
        let mut lines = fixture.lines();
        lines.insert(1, "{\"level\": \"INFO\", \"msg\"".to_string());
        let err = scan_lines(&lines, fixture.scan_options()).unwrap_err();
        assert!(matches!(err, ScanError::Malformed { after: 1, .. }), "{err}");
    }
}
