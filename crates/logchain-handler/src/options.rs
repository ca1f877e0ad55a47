//! Enricher configuration.

use serde::{Deserialize, Serialize};

use logchain_core::ChecksumMode;

/// Environment variable prefix read by [`EnricherOptions::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "LOG_";

/// What an [`Enricher`](crate::Enricher) attaches to each record.
///
/// Field names follow the JSON configuration format (`goId`, `logId`,
/// `addSum`, ...). Missing fields default to `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnricherOptions {
    /// Attach the emitting thread number under `goroutine`.
    pub go_id: bool,
    /// Attach a fresh identifier under `logId`.
    pub log_id: bool,
    /// Compute a checksum for every record.
    pub add_sum: bool,
    /// Use Full mode instead of Simple.
    pub sum_full: bool,
    /// Include the record time in the checksum.
    pub sum_time: bool,
    /// Chain each checksum from the previous record's.
    pub sum_chain: bool,
    /// Write the checksum as a separate `logSum` field instead of packing it
    /// into the identifier.
    pub sum_alone: bool,
}

impl EnricherOptions {
    /// Checksum mode selected by `sum_full`.
    pub fn mode(&self) -> ChecksumMode {
        ChecksumMode::from_full(self.sum_full)
    }

    /// Read options from `LOG_GOID`, `LOG_ID`, `LOG_SUM`, `LOG_SUM_FULL`,
    /// `LOG_SUM_TIME`, `LOG_SUM_CHAIN` and `LOG_SUM_ALONE`.
    ///
    /// Unset or empty variables keep the value from `self`.
    pub fn from_env(self) -> Self {
        self.from_env_prefixed(DEFAULT_ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom prefix.
    pub fn from_env_prefixed(self, prefix: &str) -> Self {
        self.from_lookup(|name| std::env::var(format!("{prefix}{name}")).ok())
    }

    /// Apply overrides from an arbitrary key lookup (keys without prefix).
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fields: [(&str, &mut bool); 7] = [
            ("GOID", &mut self.go_id),
            ("ID", &mut self.log_id),
            ("SUM", &mut self.add_sum),
            ("SUM_FULL", &mut self.sum_full),
            ("SUM_TIME", &mut self.sum_time),
            ("SUM_CHAIN", &mut self.sum_chain),
            ("SUM_ALONE", &mut self.sum_alone),
        ];
        for (name, slot) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = parse_bool(&value);
            }
        }
        self
    }
}

/// Lenient boolean: `true`/`on`/`yes` or a non-zero integer.
pub fn parse_bool(s: &str) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => true,
        "false" | "off" | "no" => false,
        other => other.parse::<i64>().map(|n| n != 0).unwrap_or(false),
    }
}
