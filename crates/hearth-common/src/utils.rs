//! Shared utility functions.

use chrono::{DateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{HearthError, Result};

/// Formats a timestamp for display in the given timezone.
pub fn format_timestamp<T: TimeZone>(timestamp: DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    timestamp.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Truncates a string to a maximum number of characters with an ellipsis.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Parses an IANA timezone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| HearthError::validation_field(format!("Unknown timezone '{name}': {e}"), "timezone"))
}

/// Parses a wall-clock time in `HH:MM` (24-hour) format.
pub fn parse_hh_mm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Renders a count with a singular or plural noun.
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(timestamp), "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_truncate_string() {
        let truncated = truncate_string("This is a very long string that should be truncated", 20);
        assert_eq!(truncated, "This is a very lo...");
        assert_eq!(truncate_string("Short", 20), "Short");
        // Multi-byte characters are never split.
        assert_eq!(truncate_string("🏋️🏋️🏋️🏋️🏋️🏋️", 5).chars().count(), 5);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("America/New_York").unwrap(), chrono_tz::America::New_York);
        assert_eq!(parse_timezone("UTC").unwrap(), chrono_tz::UTC);
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn test_parse_hh_mm() {
        assert_eq!(parse_hh_mm("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_hh_mm("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert!(parse_hh_mm("24:00").is_none());
        assert!(parse_hh_mm("9am").is_none());
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "workout", "workouts"), "1 workout");
        assert_eq!(pluralize(0, "workout", "workouts"), "0 workouts");
        assert_eq!(pluralize(3, "week", "weeks"), "3 weeks");
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_limit(input in "\\PC{0,80}", max in 3usize..40) {
            let truncated = truncate_string(&input, max);
            prop_assert!(truncated.chars().count() <= max);
            if input.chars().count() <= max {
                prop_assert_eq!(truncated, input);
            }
        }
    }
}
