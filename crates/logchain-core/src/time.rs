//! Fixed timestamp profiles.
//!
//! All three profiles render UTC with a `Z` suffix:
//!
//! - **millisecond** (checksum input): `2024-01-01T00:00:00.5Z`, fraction
//!   truncated to milliseconds, trailing zeros and an empty fraction dropped
//! - **nanosecond** (timestamp attribute values): same, up to nine digits
//! - **wire** (record time written by the JSON sink): always three digits,
//!   `2024-01-01T00:00:00.500Z`
//!
//! Wire and millisecond renderings of the same instant parse back to the same
//! value, so a record read back from disk hashes exactly like the original.

use chrono::{DateTime, Timelike, Utc};
use std::fmt::Write as _;

use crate::error::CoreError;

/// Render in the millisecond profile used by checksums.
pub fn format_millis(t: &DateTime<Utc>) -> String {
    format_trimmed(t, 3)
}

/// Render in the nanosecond profile used for timestamp attribute values.
pub fn format_nanos(t: &DateTime<Utc>) -> String {
    format_trimmed(t, 9)
}

/// Render the record time as written to the wire (fixed three digits).
pub fn format_wire(t: &DateTime<Utc>) -> String {
    let mut out = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    let _ = write!(out, ".{:03}Z", subsec_nanos(t) / 1_000_000);
    out
}

/// Parse an RFC 3339 timestamp with any offset and normalize to UTC.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| CoreError::InvalidTimestamp {
            value: s.to_string(),
            source,
        })
}

fn format_trimmed(t: &DateTime<Utc>, digits: u32) -> String {
    let mut out = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    let frac = subsec_nanos(t) / 10u32.pow(9 - digits);
    if frac != 0 {
        let text = format!("{:0width$}", frac, width = digits as usize);
        out.push('.');
        out.push_str(text.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

// Leap seconds are reported as nanos >= 1e9; clamp them into the last second.
fn subsec_nanos(t: &DateTime<Utc>) -> u32 {
    t.nanosecond().min(999_999_999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(nanos: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::nanoseconds(nanos as i64)
    }

    #[test]
    fn test_millis_trims_zero_fraction() {
        assert_eq!(format_millis(&at(0)), "2024-01-01T00:00:00Z");
        assert_eq!(format_millis(&at(500_000_000)), "2024-01-01T00:00:00.5Z");
        assert_eq!(format_millis(&at(120_000_000)), "2024-01-01T00:00:00.12Z");
    }

    #[test]
    fn test_millis_truncates() {
        assert_eq!(format_millis(&at(123_999_999)), "2024-01-01T00:00:00.123Z");
        assert_eq!(format_millis(&at(999_999)), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_nanos_profile() {
        assert_eq!(format_nanos(&at(1)), "2024-01-01T00:00:00.000000001Z");
        assert_eq!(format_nanos(&at(250_000_000)), "2024-01-01T00:00:00.25Z");
    }

    #[test]
    fn test_wire_profile_fixed_width() {
        assert_eq!(format_wire(&at(0)), "2024-01-01T00:00:00.000Z");
        assert_eq!(format_wire(&at(7_654_321)), "2024-01-01T00:00:00.007Z");
    }

    #[test]
    fn test_wire_parses_back_to_same_millis() {
        let t = at(987_654_321);
        let parsed = parse_rfc3339(&format_wire(&t)).unwrap();
        assert_eq!(format_millis(&parsed), format_millis(&t));
    }

    #[test]
    fn test_parse_offset_normalized() {
        let t = parse_rfc3339("2024-01-01T03:00:00.250+03:00").unwrap();
        assert_eq!(format_millis(&t), "2024-01-01T00:00:00.25Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_rfc3339("yesterday"),
            Err(CoreError::InvalidTimestamp { .. })
        ));
    }
}
