//! Replaying a checksum chain over a whole log.
//!
//! [`ChainScanner`] verifies records in order while tracking the chain value
//! each record should follow. A record whose recomputed checksum, XORed with
//! that value, differs from the checksum it carries is an anomaly: it was
//! modified, or records around it were dropped, duplicated or reordered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::io::Read;

use logchain_core::ChecksumMode;

use crate::error::{Result, ScanError, VerifyFailure};
use crate::verify::{ChecksumResult, Verifier};

/// How a log should be scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub mode: ChecksumMode,
    /// Records chain from their predecessor.
    pub chain: bool,
    /// Chain value before the first record.
    pub seed: u16,
    /// After an anomaly, continue from the anomalous record's checksum.
    ///
    /// Without it, every record after a break keeps being flagged.
    pub resync: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: ChecksumMode::Simple,
            chain: false,
            seed: 0,
            resync: true,
        }
    }
}

/// Verdict for one record.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The record verifies against the current chain value.
    Verified(ChecksumResult),
    /// The record parsed but its checksum does not match.
    Anomaly {
        result: ChecksumResult,
        /// Checksum the record should carry given the chain so far.
        expected: u16,
    },
    /// The record could not be verified at all.
    Rejected(VerifyFailure),
}

impl ScanOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Totals of a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub records: u64,
    pub verified: u64,
    pub anomalies: u64,
    pub rejected: u64,
}

impl ScanReport {
    /// Whether every record verified.
    pub fn is_clean(&self) -> bool {
        self.anomalies == 0 && self.rejected == 0
    }
}

/// Stateful chain verifier.
#[derive(Debug)]
pub struct ChainScanner {
    options: ScanOptions,
    verifier: Verifier,
    carry: u16,
    report: ScanReport,
}

impl ChainScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            verifier: Verifier::new(options.mode),
            carry: options.seed,
            report: ScanReport::default(),
        }
    }

    /// Chain value the next record is checked against.
    pub fn carry(&self) -> u16 {
        self.carry
    }

    pub fn report(&self) -> ScanReport {
        self.report
    }

    /// Check one record and advance the chain.
    pub fn check(&mut self, record: &Map<String, Json>) -> ScanOutcome {
        self.report.records += 1;
        let index = self.report.records;

        let result = match self.verifier.verify(record) {
            Ok(result) => result,
            Err(failure) => {
                self.report.rejected += 1;
                tracing::warn!(record = index, error = %failure, "can't verify record");
                return ScanOutcome::Rejected(failure);
            }
        };

        let expected = result.sum ^ self.carry;
        if expected == result.log_sum {
            self.report.verified += 1;
            tracing::trace!(
                record = index,
                log_sum = %format_args!("{:04x}", result.log_sum),
                "record verified"
            );
            if self.options.chain {
                self.carry = result.log_sum;
            }
            return ScanOutcome::Verified(result);
        }

        self.report.anomalies += 1;
        tracing::warn!(
            record = index,
            time = ?result.time,
            level = %result.level,
            msg = %result.message,
            log_id = %result.log_id,
            source = %result.source_to_string(),
            log_sum = %format_args!("{:04x}", result.log_sum),
            sum = %format_args!("{:04x}", expected),
            anomalies = self.report.anomalies,
            "bad log checksum"
        );
        if self.options.chain && self.options.resync {
            self.carry = result.log_sum;
        }
        ScanOutcome::Anomaly { result, expected }
    }

    /// Scan a stream of JSON objects, calling `observe` with each verdict.
    pub fn scan_with<R, F>(&mut self, reader: R, mut observe: F) -> Result<ScanReport>
    where
        R: Read,
        F: FnMut(u64, &ScanOutcome),
    {
        let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Map<String, Json>>();
        for item in stream {
            let record = item.map_err(|source| {
                if source.is_io() {
                    ScanError::Io(source.into())
                } else {
                    ScanError::Malformed {
                        after: self.report.records,
                        source,
                    }
                }
            })?;
            let outcome = self.check(&record);
            observe(self.report.records, &outcome);
        }
        tracing::debug!(
            records = self.report.records,
            anomalies = self.report.anomalies,
            rejected = self.report.rejected,
            "scan finished"
        );
        Ok(self.report)
    }

    /// Scan a stream of JSON objects.
    pub fn scan_reader<R: Read>(&mut self, reader: R) -> Result<ScanReport> {
        self.scan_with(reader, |_, _| {})
    }
}

/// Scan `reader` with fresh state.
pub fn scan_reader<R: Read>(reader: R, options: ScanOptions) -> Result<ScanReport> {
    ChainScanner::new(options).scan_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logchain_core::{checksum_simple, Level, LogId, Record};
    use serde_json::json;

    /// JSON line of a Simple-mode record without time, chained from `carry`.
    fn line(msg: &str, carry: u16) -> (String, u16) {
        let record = Record::new(Level::INFO, msg);
        let sum = checksum_simple(carry, false, &record, &LogId::NIL);
        let text = json!({"level": "INFO", "msg": msg, "logSum": format!("{sum:04x}")}).to_string();
        (text, sum)
    }

    fn chained(msgs: &[&str]) -> Vec<String> {
        let mut carry = 0;
        msgs.iter()
            .map(|m| {
                let (text, sum) = line(m, carry);
                carry = sum;
                text
            })
            .collect()
    }

    fn chain_options(resync: bool) -> ScanOptions {
        ScanOptions {
            chain: true,
            resync,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_chain() {
        let log = chained(&["a", "b", "c", "d"]).join("\n");
        let report = scan_reader(log.as_bytes(), chain_options(true)).unwrap();
        assert_eq!(report.records, 4);
        assert_eq!(report.verified, 4);
        assert!(report.is_clean());
    }

    #[test]
    fn test_swap_detected_with_resync() {
        let mut lines = chained(&["a", "b", "c", "d", "e"]);
        lines.swap(1, 2);
        let report = scan_reader(lines.join("\n").as_bytes(), chain_options(true)).unwrap();
        // The swapped pair and the record after it break; resync heals the rest.
        assert_eq!(report.anomalies, 3);
        assert_eq!(report.verified, 2);
    }

    #[test]
    fn test_drop_heals_after_one_anomaly() {
        let mut lines = chained(&["a", "b", "c", "d", "e"]);
        lines.remove(2);
        let report = scan_reader(lines.join("\n").as_bytes(), chain_options(true)).unwrap();
        assert_eq!(report.anomalies, 1);
        assert_eq!(report.verified, 3);
    }

    #[test]
    fn test_sticky_without_resync() {
        let mut lines = chained(&["a", "b", "c", "d", "e"]);
        lines.remove(1);
        let report = scan_reader(lines.join("\n").as_bytes(), chain_options(false)).unwrap();
        assert_eq!(report.verified, 1);
        assert_eq!(report.anomalies, 3);
    }

    #[test]
    fn test_rejected_counted() {
        let log = format!("{}\n{{\"msg\": \"no evidence\"}}", line("a", 0).0);
        let mut scanner = ChainScanner::new(ScanOptions::default());
        let mut verdicts = Vec::new();
        let report = scanner
            .scan_with(log.as_bytes(), |i, o| verdicts.push((i, o.is_verified())))
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(verdicts, vec![(1, true), (2, false)]);
    }

    #[test]
    fn test_malformed_json_aborts() {
        let log = format!("{}\n{{not json", line("a", 0).0);
        let err = scan_reader(log.as_bytes(), ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ScanError::Malformed { after: 1, .. }));
    }

    #[test]
    fn test_options_from_json() {
        let options: ScanOptions = serde_json::from_str(r#"{"mode": "full", "chain": true}"#).unwrap();
        assert_eq!(options.mode, ChecksumMode::Full);
        assert!(options.chain);
        assert!(options.resync);

        let report = ScanReport {
            records: 2,
            verified: 1,
            anomalies: 1,
            rejected: 0,
        };
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            json!({"records": 2, "verified": 1, "anomalies": 1, "rejected": 0})
        );
    }

    #[test]
    fn test_seed_without_chain() {
        let record = Record::new(Level::INFO, "s");
        let sum = checksum_simple(0x0F0F, false, &record, &LogId::NIL);
        let text = json!({"level": "INFO", "msg": "s", "logSum": format!("{sum:04x}")}).to_string();
        let log = format!("{text}\n{text}");
        let options = ScanOptions {
            seed: 0x0F0F,
            ..Default::default()
        };
        let report = scan_reader(log.as_bytes(), options).unwrap();
        assert_eq!(report.verified, 2);
    }
}
