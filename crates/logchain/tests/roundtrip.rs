//! Records written by the enricher verify when read back.

mod common;

use proptest::prelude::*;
use std::thread;

use common::{config, logger};
use logchain::{scan_reader, Attr, ChecksumMode, ScanOptions, Value};
use logchain_testkit::fixtures::{chained_options, scan_lines, LogFixture};
use logchain_testkit::generators::record;

fn scan_options(full: bool, chain: bool) -> ScanOptions {
    ScanOptions {
        mode: ChecksumMode::from_full(full),
        chain,
        ..Default::default()
    }
}

#[test]
fn test_every_mode_verifies() {
    for full in [false, true] {
        for chain in [false, true] {
            for alone in [false, true] {
                let (log, buf) = logger(&config(full, chain, alone));
                let log = log.with(vec![Attr::new("service", "api")]);
                log.info("started", vec![Attr::new("port", 8080)]).unwrap();
                log.warn("slow", vec![Attr::new("elapsed_ms", 1.5)]).unwrap();
                log.with_group("req")
                    .with(vec![Attr::new("path", "/")])
                    .debug("routed", vec![Attr::new("status", 200)])
                    .unwrap();

                let report = scan_reader(buf.text().as_bytes(), scan_options(full, chain)).unwrap();
                assert_eq!(report.records, 3);
                assert!(
                    report.is_clean(),
                    "full={full} chain={chain} alone={alone}: {report:?}\n{}",
                    buf.text()
                );
            }
        }
    }
}

#[test]
fn test_log_sum_field_only_when_alone() {
    let (packed, packed_buf) = logger(&config(false, false, false));
    let (alone, alone_buf) = logger(&config(false, false, true));
    packed.info("m", vec![]).unwrap();
    alone.info("m", vec![]).unwrap();
    assert!(!packed_buf.text().contains("logSum"));
    assert!(alone_buf.text().contains("\"logSum\""));
}

#[test]
fn test_grouped_and_lazy_match_eager() {
    let mut cfg = config(true, false, true);
    cfg.enricher.log_id = false;
    cfg.enricher.go_id = false;
    cfg.time = false;

    let (grouped, grouped_buf) = logger(&cfg);
    grouped
        .with_group("req")
        .with(vec![Attr::lazy("method", || Value::from("GET"))])
        .info("m", vec![Attr::new("status", 200)])
        .unwrap();

    let (eager, eager_buf) = logger(&cfg);
    eager
        .info(
            "m",
            vec![Attr::group(
                "req",
                vec![Attr::new("method", "GET"), Attr::new("status", 200)],
            )],
        )
        .unwrap();

    assert_eq!(grouped_buf.text(), eager_buf.text());
    assert!(grouped_buf.text().contains("\"req\":{\"method\":\"GET\",\"status\":200}"));
}

#[test]
fn test_concurrent_emitters_chain_in_sink_order() {
    let (log, buf) = logger(&config(true, true, false));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let log = log.with(vec![Attr::new("worker", worker)]);
            thread::spawn(move || {
                for i in 0..50 {
                    log.info("tick", vec![Attr::new("i", i)]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let report = scan_reader(buf.text().as_bytes(), scan_options(true, true)).unwrap();
    assert_eq!(report.records, 200);
    assert!(report.is_clean(), "{report:?}");
}

#[test]
fn test_seed_applies_without_chain() {
    let mut cfg = config(false, false, true);
    cfg.seed = 0xBEEF;
    let (log, buf) = logger(&cfg);
    log.info("a", vec![]).unwrap();
    log.info("b", vec![]).unwrap();

    let unseeded = scan_reader(buf.text().as_bytes(), scan_options(false, false)).unwrap();
    assert_eq!(unseeded.anomalies, 2);
    let seeded = ScanOptions {
        seed: 0xBEEF,
        ..scan_options(false, false)
    };
    assert!(scan_reader(buf.text().as_bytes(), seeded).unwrap().is_clean());
}

#[test]
fn test_reordered_lines_detected() {
    let fixture = LogFixture::new(chained_options(false));
    for i in 0..6 {
        fixture
            .emit(logchain::Record::new(logchain::Level::INFO, format!("r{i}")))
            .unwrap();
    }
    let mut lines = fixture.lines();
    lines.swap(2, 3);
    let report = scan_lines(&lines, fixture.scan_options()).unwrap();
    assert_eq!(report.anomalies, 3);
    assert_eq!(report.verified, 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_records_verify(
        records in prop::collection::vec(record(), 1..8),
        full in any::<bool>(),
    ) {
        let fixture = LogFixture::with_seed(chained_options(full), 0x1234);
        for record in records.iter().cloned() {
            fixture.emit(record).unwrap();
        }
        let report = fixture.scan().unwrap();
        prop_assert_eq!(report.records, records.len() as u64);
        prop_assert!(report.is_clean(), "{:?}\n{}", report, fixture.output());
    }
}
