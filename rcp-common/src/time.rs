//! Timestamp utilities

use chrono::{DateTime, Local};

/// Get current local timestamp
///
/// Result artifacts are stamped in local time so that file names line up
/// with the operator's wall clock.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Second-granularity stamp used in artifact file names (`YYYYMMDD_HHMMSS`)
pub fn artifact_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// ISO-8601 timestamp with microseconds and no offset
/// (e.g. `2025-03-14T09:26:53.589793`)
pub fn iso8601(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 14, 9, 26, 53)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_artifact_stamp_format() {
        assert_eq!(artifact_stamp(&fixed()), "20250314_092653");
    }

    #[test]
    fn test_iso8601_format() {
        assert_eq!(iso8601(&fixed()), "2025-03-14T09:26:53.000000");
    }

    #[test]
    fn test_artifact_stamp_is_fixed_width() {
        let stamp = artifact_stamp(&now());
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }
}
