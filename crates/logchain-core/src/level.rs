//! Log levels and their canonical labels.
//!
//! A level is a signed integer. The named levels leave gaps so that
//! intermediate values can be expressed as `LABEL+N`, e.g. `WARN+1`.
//! The label is part of the Simple checksum input, so its rendering must
//! never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A log level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub i32);

impl Level {
    pub const FLOOD: Self = Self(-12);
    pub const TRACE: Self = Self(-8);
    pub const DEBUG: Self = Self(-4);
    pub const INFO: Self = Self(0);
    pub const NOTICE: Self = Self(2);
    pub const WARN: Self = Self(4);
    pub const ERROR: Self = Self(8);
    pub const CRIT: Self = Self(10);
    pub const ALERT: Self = Self(12);
    pub const EMERG: Self = Self(14);
    pub const FATAL: Self = Self(16);
    pub const PANIC: Self = Self(18);
    pub const SILENT: Self = Self(20);

    /// Level used when a label or config string cannot be understood.
    pub const DEFAULT: Self = Self::INFO;

    /// Get the numeric value.
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Render the canonical label (`INFO`, `WARN+1`, `FLOOD-3`).
    pub fn label(self) -> String {
        let (base, name) = NAMED
            .iter()
            .rev()
            .find(|(lvl, _)| lvl.0 <= self.0)
            .copied()
            .unwrap_or(NAMED[0]);
        let delta = self.0 - base.0;
        if delta == 0 {
            name.to_string()
        } else {
            format!("{name}{delta:+}")
        }
    }

    /// Parse a canonical label, case-insensitively.
    ///
    /// Accepts an optional signed delta suffix (`error+2`, `INFO-1`).
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        let (name, delta) = match label.find(|c: char| c == '+' || c == '-') {
            Some(0) | None => (label.as_str(), 0),
            Some(pos) => {
                let delta: i32 = label[pos..].parse().ok()?;
                (&label[..pos], delta)
            }
        };
        let (base, _) = NAMED.iter().find(|(_, n)| *n == name)?;
        base.0.checked_add(delta).map(Self)
    }

    /// Parse a label, falling back to [`Level::DEFAULT`].
    pub fn from_label(label: &str) -> Self {
        Self::parse_label(label).unwrap_or(Self::DEFAULT)
    }

    /// Lower-case configuration name for named levels, decimal otherwise.
    pub fn config_name(self) -> String {
        match NAMED.iter().find(|(lvl, _)| *lvl == self) {
            Some((_, name)) => name.to_ascii_lowercase(),
            None => self.0.to_string(),
        }
    }
}

const NAMED: [(Level, &str); 13] = [
    (Level::FLOOD, "FLOOD"),
    (Level::TRACE, "TRACE"),
    (Level::DEBUG, "DEBUG"),
    (Level::INFO, "INFO"),
    (Level::NOTICE, "NOTICE"),
    (Level::WARN, "WARN"),
    (Level::ERROR, "ERROR"),
    (Level::CRIT, "CRIT"),
    (Level::ALERT, "ALERT"),
    (Level::EMERG, "EMERG"),
    (Level::FATAL, "FATAL"),
    (Level::PANIC, "PANIC"),
    (Level::SILENT, "SILENT"),
];

impl Default for Level {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.label())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parses configuration strings: a level name (`"debug"`) or a decimal
/// integer (`"-4"`).
impl FromStr for Level {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some((lvl, _)) = NAMED
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(&lower))
        {
            return Ok(*lvl);
        }
        lower
            .parse::<i32>()
            .map(Self)
            .map_err(|_| CoreError::InvalidLevel(s.to_string()))
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Self(value)
    }
}
