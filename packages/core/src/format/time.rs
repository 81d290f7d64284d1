//! Date and duration helpers for embed text.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Epoch seconds as ISO 8601 UTC, the format Discord expects for embed
/// timestamps.
pub fn epoch_to_iso8601(epoch_s: u64) -> Option<String> {
    let secs = i64::try_from(epoch_s).ok()?;
    let at = Utc.timestamp_opt(secs, 0).single()?;
    Some(to_iso8601(at))
}

pub fn to_iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Runtime in milliseconds as `"2h 5m"`, or `"45m"` under an hour.
pub fn duration_to_str(duration_ms: u64) -> String {
    let total_minutes = duration_ms.saturating_add(30_000) / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours == 0 {
        format!("{}m", minutes)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

/// `"2024-03-07"` as `"March 07, 2024"`.
///
/// A trailing time part is ignored. Values that are not dates are returned
/// unchanged.
pub fn format_originally_available_date(date: Option<&str>) -> String {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return String::new();
    };

    let day = date.get(..10).unwrap_or(date);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%B %d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_as_utc_with_offset() {
        assert_eq!(
            epoch_to_iso8601(1_700_000_000).as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
    }

    #[test]
    fn epoch_zero() {
        assert_eq!(
            epoch_to_iso8601(0).as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn duration_under_an_hour_shows_minutes_only() {
        assert_eq!(duration_to_str(45 * 60_000), "45m");
    }

    #[test]
    fn duration_over_an_hour() {
        assert_eq!(duration_to_str(170 * 60_000), "2h 50m");
    }

    #[test]
    fn duration_rounds_to_nearest_minute() {
        assert_eq!(duration_to_str(89 * 60_000 + 31_000), "1h 30m");
        assert_eq!(duration_to_str(89 * 60_000 + 29_000), "1h 29m");
    }

    #[test]
    fn duration_rounding_carries_into_the_hour() {
        assert_eq!(duration_to_str(119 * 60_000 + 45_000), "2h 0m");
    }

    #[test]
    fn absurd_duration_does_not_overflow() {
        let text = duration_to_str(u64::MAX);
        assert!(text.ends_with('m'));
        assert!(text.contains('h'));
    }

    #[test]
    fn release_date_is_spelled_out() {
        assert_eq!(
            format_originally_available_date(Some("2024-03-07")),
            "March 07, 2024"
        );
    }

    #[test]
    fn release_date_with_time_part() {
        assert_eq!(
            format_originally_available_date(Some("1995-12-15 00:00:00")),
            "December 15, 1995"
        );
    }

    #[test]
    fn missing_release_date_is_empty() {
        assert_eq!(format_originally_available_date(None), "");
        assert_eq!(format_originally_available_date(Some("  ")), "");
    }

    #[test]
    fn unparsable_release_date_passes_through() {
        assert_eq!(format_originally_available_date(Some("Spring 2024")), "Spring 2024");
    }
}
