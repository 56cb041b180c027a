//! Timestamp parsing and time-window validation.
//!
//! All stored instants are UTC. Input strings carrying an explicit offset
//! are converted; strings with no offset are interpreted in the configured
//! default zone (the deployment's local zone, +05:30 by default) before
//! conversion. The past-check always compares converted UTC instants
//! against UTC now, never rendered local strings.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors produced while parsing or validating a time window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("{field} is not a valid ISO-8601 timestamp: '{value}'")]
    Unparseable { field: &'static str, value: String },
    #[error("startTime must be before endTime")]
    InvertedWindow,
    #[error("startTime must be at least {lead_minutes} minutes in the future (UTC)")]
    StartsTooSoon { lead_minutes: i64 },
}

/// Parse a timestamp string into a UTC instant.
///
/// RFC 3339 strings with an offset are honored as-is. Bare local strings
/// (`2025-10-11T16:00:00`) are assumed to be in `default_offset` and
/// shifted to UTC.
pub fn parse_timestamp(
    field: &'static str,
    value: &str,
    default_offset: FixedOffset,
) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| TimeParseError::Unparseable {
            field,
            value: value.to_string(),
        })?;

    naive
        .and_local_timezone(default_offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(TimeParseError::Unparseable {
            field,
            value: value.to_string(),
        })
}

/// Validate an already-parsed window: start < end.
pub fn validate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), TimeParseError> {
    if start >= end {
        return Err(TimeParseError::InvertedWindow);
    }
    Ok(())
}

/// Validate that `start` is at least `lead_minutes` ahead of UTC now.
pub fn validate_lead_time(
    start: DateTime<Utc>,
    lead_minutes: i64,
    now: DateTime<Utc>,
) -> Result<(), TimeParseError> {
    if start <= now + Duration::minutes(lead_minutes) {
        return Err(TimeParseError::StartsTooSoon { lead_minutes });
    }
    Ok(())
}

/// Whole-minute duration of a window, rounded up.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    (seconds + 59) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn colombo() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    #[test]
    fn rfc3339_with_offset_is_honored() {
        let parsed = parse_timestamp("startTime", "2099-01-01T10:00:00Z", colombo()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn bare_local_string_shifts_by_default_offset() {
        // 16:00 in Colombo (+05:30) is 10:30 UTC
        let parsed = parse_timestamp("startTime", "2025-10-11T16:00:00", colombo()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 10, 11, 10, 30, 0).unwrap());
    }

    #[test]
    fn garbage_is_rejected_with_field_name() {
        let err = parse_timestamp("endTime", "next tuesday", colombo()).unwrap_err();
        assert!(matches!(err, TimeParseError::Unparseable { field: "endTime", .. }));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let start = Utc.with_ymd_and_hms(2099, 1, 1, 11, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(validate_window(start, end), Err(TimeParseError::InvertedWindow));
        assert_eq!(validate_window(start, start), Err(TimeParseError::InvertedWindow));
    }

    #[test]
    fn lead_time_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let at_limit = now + Duration::minutes(5);
        assert!(validate_lead_time(at_limit, 5, now).is_err());
        let past_limit = now + Duration::minutes(6);
        assert!(validate_lead_time(past_limit, 5, now).is_ok());
    }

    #[test]
    fn duration_rounds_up_to_whole_minutes() {
        let start = Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap();
        let end = start + Duration::seconds(61);
        assert_eq!(duration_minutes(start, end), 2);
        assert_eq!(duration_minutes(start, start + Duration::minutes(60)), 60);
    }
}
