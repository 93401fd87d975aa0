//! Conversions between Slack's timestamp encodings.
//!
//! Permalinks embed a compact, all-digit timestamp (`p1234567890123456`), the
//! Web API speaks canonical `seconds.microseconds` strings, and transcripts are
//! rendered in the workspace's operating timezone, which is pinned to a fixed
//! UTC+9 offset instead of the process's local zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::{AppError, Result};

/// Offset of the platform's operating timezone (JST).
pub const PLATFORM_UTC_OFFSET_SECS: i32 = 9 * 60 * 60;

const SECONDS_WIDTH: usize = 10;
const MICROS_WIDTH: usize = 6;

pub fn platform_offset() -> FixedOffset {
    FixedOffset::east_opt(PLATFORM_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Right-pad with zeros or truncate to exactly six digits. Input must be ASCII.
fn fit_micros(fraction: &str) -> String {
    let mut micros: String = fraction.chars().take(MICROS_WIDTH).collect();
    while micros.len() < MICROS_WIDTH {
        micros.push('0');
    }
    micros
}

/// Decode a permalink timestamp (digits after the `p`) into canonical form.
pub fn decode_compact(digits: &str) -> Result<String> {
    if digits.is_empty() || !is_digits(digits) {
        return Err(AppError::InvalidTimestamp(digits.to_string()));
    }
    if digits.len() < SECONDS_WIDTH {
        return Err(AppError::InvalidTimestamp(format!(
            "{} (expected at least {} digits)",
            digits, SECONDS_WIDTH
        )));
    }

    let (seconds, fraction) = digits.split_at(SECONDS_WIDTH);
    Ok(format!("{}.{}", seconds, fit_micros(fraction)))
}

/// Parse a canonical `seconds.microseconds` timestamp into an instant.
pub fn to_instant(ts: &str) -> Result<DateTime<Utc>> {
    let invalid = || AppError::InvalidTimestamp(ts.to_string());

    let (seconds, fraction) = ts.split_once('.').ok_or_else(invalid)?;
    if seconds.is_empty() || !is_digits(seconds) || !is_digits(fraction) {
        return Err(invalid());
    }

    let secs: i64 = seconds.parse().map_err(|_| invalid())?;
    let micros: u32 = fit_micros(fraction).parse().map_err(|_| invalid())?;

    DateTime::from_timestamp(secs, micros * 1_000).ok_or_else(invalid)
}

/// Render a canonical timestamp as `YYYY-MM-DD HH:MM:SS` in the platform timezone.
pub fn render(ts: &str) -> Result<String> {
    let instant = to_instant(ts)?;
    Ok(instant
        .with_timezone(&platform_offset())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string())
}

/// The date a transcript was captured on, as seen in the platform timezone.
pub fn capture_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&platform_offset()).date_naive()
}

/// Which end of a history window a user-supplied bound describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Oldest,
    Latest,
}

/// Turn a `--oldest`/`--latest` argument into a canonical timestamp.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (both read in the platform
/// timezone), unix seconds, or an already canonical timestamp. A bare date used
/// as the latest bound covers the whole day.
pub fn parse_bound(input: &str, bound: Bound) -> Result<String> {
    let input = input.trim();
    let invalid = || AppError::InvalidDate(input.to_string());

    if input.is_empty() {
        return Err(invalid());
    }

    if is_digits(input) {
        let secs: i64 = input.parse().map_err(|_| invalid())?;
        return Ok(format!("{}.000000", secs));
    }

    if let Some((seconds, fraction)) = input.split_once('.')
        && !seconds.is_empty()
        && is_digits(seconds)
        && is_digits(fraction)
    {
        to_instant(input).map_err(|_| invalid())?;
        return Ok(format!("{}.{}", seconds, fit_micros(fraction)));
    }

    let naive = match NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        Ok(datetime) => datetime,
        Err(_) => {
            let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())?;
            match bound {
                Bound::Oldest => date.and_hms_opt(0, 0, 0),
                Bound::Latest => date.and_hms_opt(23, 59, 59),
            }
            .ok_or_else(invalid)?
        }
    };

    let instant = platform_offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)?;

    Ok(format!("{}.000000", instant.timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_compact_full_width() {
        assert_eq!(
            decode_compact("1234567890123456").unwrap(),
            "1234567890.123456"
        );
    }

    #[test]
    fn test_decode_compact_pads_short_remainder() {
        assert_eq!(decode_compact("12345678901").unwrap(), "1234567890.100000");
    }

    #[test]
    fn test_decode_compact_seconds_only() {
        assert_eq!(decode_compact("1234567890").unwrap(), "1234567890.000000");
    }

    #[test]
    fn test_decode_compact_truncates_long_remainder() {
        assert_eq!(
            decode_compact("123456789012345678").unwrap(),
            "1234567890.123456"
        );
    }

    #[test]
    fn test_decode_compact_too_short() {
        let err = decode_compact("123456789").unwrap_err();
        assert!(matches!(err, AppError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_decode_compact_rejects_non_digits() {
        assert!(matches!(
            decode_compact("12345abc90123456"),
            Err(AppError::InvalidTimestamp(_))
        ));
        assert!(matches!(decode_compact(""), Err(AppError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_decoded_seconds_match_leading_digits() {
        let samples = [
            "1234567890",
            "17706898875",
            "1770689887565249",
            "0000000001999999",
            "9999999999000000123",
        ];
        for sample in samples {
            let canonical = decode_compact(sample).unwrap();
            let instant = to_instant(&canonical).unwrap();
            let expected: i64 = sample[..10].parse().unwrap();
            assert_eq!(instant.timestamp(), expected, "sample {}", sample);
        }
    }

    #[test]
    fn test_to_instant_micros() {
        let instant = to_instant("1234567890.000123").unwrap();
        assert_eq!(instant.timestamp(), 1234567890);
        assert_eq!(instant.timestamp_subsec_micros(), 123);
    }

    #[test]
    fn test_to_instant_pads_fraction() {
        let instant = to_instant("1234567890.5").unwrap();
        assert_eq!(instant.timestamp_subsec_micros(), 500_000);
    }

    #[test]
    fn test_to_instant_rejects_malformed() {
        for bad in ["1234567890", "abc.123456", "1234567890.12x", ".123456", "1.2.3"] {
            assert!(
                matches!(to_instant(bad), Err(AppError::InvalidTimestamp(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_render_uses_platform_offset() {
        assert_eq!(render("1770689887.565249").unwrap(), "2026-02-10 11:18:07");
        assert_eq!(render("0.000000").unwrap(), "1970-01-01 09:00:00");
    }

    #[test]
    fn test_capture_date_rolls_over_in_platform_zone() {
        let late_utc = DateTime::from_timestamp(1704034800, 0).unwrap();
        assert_eq!(
            capture_date(late_utc),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_bound_date() {
        assert_eq!(
            parse_bound("2024-01-01", Bound::Oldest).unwrap(),
            "1704034800.000000"
        );
        assert_eq!(
            parse_bound("2024-12-31", Bound::Latest).unwrap(),
            "1735657199.000000"
        );
    }

    #[test]
    fn test_parse_bound_datetime() {
        assert_eq!(
            parse_bound("2024-01-01T09:30:00", Bound::Oldest).unwrap(),
            "1704069000.000000"
        );
    }

    #[test]
    fn test_parse_bound_unix_and_canonical() {
        assert_eq!(
            parse_bound("1704067200", Bound::Latest).unwrap(),
            "1704067200.000000"
        );
        assert_eq!(
            parse_bound("1704067200.5", Bound::Oldest).unwrap(),
            "1704067200.500000"
        );
    }

    #[test]
    fn test_parse_bound_rejects_garbage() {
        assert!(matches!(
            parse_bound("yesterday", Bound::Oldest),
            Err(AppError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_bound("", Bound::Latest),
            Err(AppError::InvalidDate(_))
        ));
    }
}
