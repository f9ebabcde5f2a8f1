//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 TEXT columns and exchanged as RFC 3339 strings.
//! Stored values always carry nine fractional digits, so they keep full
//! precision and still sort lexically in `ORDER BY`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp
///
/// Accepts any RFC 3339 offset and normalizes to UTC.
pub fn from_db(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", raw, e)))
}

/// Parse an optional stored timestamp
pub fn opt_from_db(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(from_db).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_db_format_is_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2025, 7, 4, 21, 30, 0).unwrap();
        assert_eq!(to_db(&ts), "2025-07-04T21:30:00.000000000Z");
        assert_eq!(from_db("2025-07-04T21:30:00Z").unwrap(), ts);
    }

    #[test]
    fn test_sub_second_precision_survives_storage() {
        let ts = Utc.with_ymd_and_hms(2025, 7, 4, 21, 0, 0).unwrap() + Duration::milliseconds(500);

        assert_eq!(from_db(&to_db(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_stored_form_sorts_chronologically() {
        let whole = Utc.with_ymd_and_hms(2025, 7, 4, 21, 0, 0).unwrap();
        let later = whole + Duration::milliseconds(500);

        assert!(to_db(&whole) < to_db(&later));
    }

    #[test]
    fn test_offsets_normalize_to_utc() {
        let parsed = from_db("2025-07-04T23:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 4, 21, 30, 0).unwrap());
    }

    #[test]
    fn test_invalid_timestamp_is_error() {
        assert!(from_db("tomorrow night").is_err());
        assert!(opt_from_db(Some("nope".to_string())).is_err());
        assert_eq!(opt_from_db(None).unwrap(), None);
    }
}
