//! Golden checksum vectors.
//!
//! Fixed inputs with checksums computed independently of this crate
//! (CRC-16/XMODEM, polynomial 0x1021, initial value 0). Any change to the
//! checksum input layout shows up here first.

use chrono::{DateTime, TimeZone, Utc};

use logchain_core::{checksum, Attr, ChecksumMode, Level, LogId, Record};

/// A golden checksum vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub mode: ChecksumMode,
    /// Chain value XORed into the checksum.
    pub carry: u16,
    /// Whether the record time is part of the input.
    pub include_time: bool,
    pub level: Level,
    pub message: &'static str,
    pub attrs: Vec<Attr>,
    /// Identifier bytes; `None` for the nil identifier.
    pub id: Option<[u8; 16]>,
    /// Expected checksum.
    pub expected: u16,
}

impl GoldenVector {
    /// The record this vector describes, timestamped at [`epoch`].
    pub fn record(&self) -> Record {
        Record::at(epoch(), self.level, self.message).with_attrs(self.attrs.clone())
    }

    pub fn log_id(&self) -> LogId {
        self.id.map(LogId::from_bytes).unwrap_or(LogId::NIL)
    }

    /// Checksum computed by the engine.
    pub fn compute(&self) -> u16 {
        checksum(
            self.mode,
            self.carry,
            self.include_time,
            &self.record(),
            &self.log_id(),
        )
    }
}

/// 2024-01-01T00:00:00Z, the time of every vector record.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or_default()
}

/// Identifier bytes `01 02 .. 10`.
pub const SEQUENTIAL_ID: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
];

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    let base = GoldenVector {
        name: "",
        mode: ChecksumMode::Simple,
        carry: 0,
        include_time: true,
        level: Level::INFO,
        message: "hello",
        attrs: Vec::new(),
        id: None,
        expected: 0,
    };
    let full_attrs = vec![Attr::new("user", "alice"), Attr::new("n", 42)];

    vec![
        GoldenVector {
            name: "simple with time",
            expected: 0x5017,
            ..base.clone()
        },
        GoldenVector {
            name: "simple without time",
            include_time: false,
            expected: 0xE57C,
            ..base.clone()
        },
        GoldenVector {
            name: "simple ignores attributes",
            include_time: false,
            attrs: full_attrs.clone(),
            expected: 0xE57C,
            ..base.clone()
        },
        GoldenVector {
            name: "simple with identifier",
            id: Some(SEQUENTIAL_ID),
            expected: 0xAA66,
            ..base.clone()
        },
        GoldenVector {
            name: "simple empty message",
            include_time: false,
            message: "",
            expected: 0x8506,
            ..base.clone()
        },
        GoldenVector {
            name: "simple offset level with carry",
            carry: 0xBEEF,
            include_time: false,
            level: Level(Level::WARN.as_i32() + 1),
            message: "disk",
            expected: 0x1DCE,
            ..base.clone()
        },
        GoldenVector {
            name: "full with attributes",
            mode: ChecksumMode::Full,
            attrs: full_attrs.clone(),
            expected: 0x82E4,
            ..base.clone()
        },
        GoldenVector {
            name: "full with attributes and identifier",
            mode: ChecksumMode::Full,
            attrs: full_attrs,
            id: Some(SEQUENTIAL_ID),
            expected: 0xB73C,
            ..base
        },
    ]
}

/// A Simple-mode chain of messages `b`, `c`, `d` at INFO without time,
/// starting from zero, with the chain value after each record.
pub fn chain_vector() -> [(&'static str, u16); 3] {
    [("b", 0x8BC9), ("c", 0x1021), ("d", 0xFB2E)]
}

/// Check every vector, returning the names of the ones that disagree.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .into_iter()
        .filter_map(|v| {
            let actual = v.compute();
            (actual != v.expected)
                .then(|| format!("{}: expected {:04x}, got {:04x}", v.name, v.expected, actual))
        })
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
