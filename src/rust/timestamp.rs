//! Lenient timestamp parsing for review dates.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::pipeline::ScoringError;

/// Format used when a timestamp is written back out
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses a timestamp, localizing values without an offset to `offset`.
///
/// Returns `None` for blank or unrecognized input.
pub fn parse_timestamp(value: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return offset.from_local_datetime(&naive).single();
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}

/// Parses a calendar date such as `2024-05-31`.
pub fn parse_date(value: &str) -> Result<NaiveDate, ScoringError> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| ScoringError::ValidationError(format!("Invalid date '{}'", value)))
}

/// Parses a UTC offset such as `+07:00`, `-0530`, `+7`, `Z` or `UTC`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ScoringError> {
    let invalid = || ScoringError::ValidationError(format!("Invalid UTC offset '{}'", value));
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => match (rest.get(..2), rest.get(2..)) {
            (Some(h), Some(m)) => (h, m),
            _ => return Err(invalid()),
        },
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// The machine's current UTC offset.
pub fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_parses_common_formats() {
        for value in [
            "2024-05-31 14:30",
            "2024-05-31 14:30:00",
            "2024-05-31T14:30:00",
            "2024/05/31 14:30",
            "2024-05-31T14:30:00+00:00",
        ] {
            let ts = parse_timestamp(value, utc()).unwrap_or_else(|| panic!("{}", value));
            assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 31));
            assert_eq!((ts.hour(), ts.minute()), (14, 30));
        }
    }

    #[test]
    fn test_date_only_is_midnight() {
        let ts = parse_timestamp("2024-05-31", utc()).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-31 00:00");
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_timestamp("", utc()).is_none());
        assert!(parse_timestamp("yesterday", utc()).is_none());
        assert!(parse_timestamp("2024-13-45", utc()).is_none());
    }

    #[test]
    fn test_offset_localizes_naive_values() {
        let offset = parse_utc_offset("+07:00").unwrap();
        let ts = parse_timestamp("2024-05-31 14:30", offset).unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 7 * 3600);
        assert_eq!(ts.hour(), 14);
    }

    #[test]
    fn test_utc_offsets() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("+7").unwrap().local_minus_utc(), 7 * 3600);
        assert!(parse_utc_offset("07:00").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
        assert!(parse_utc_offset("+-05:00").is_err());
    }

    #[test]
    fn test_non_ascii_offsets_are_rejected() {
        for value in ["+1é1", "-é12", "+０７００", "+7:é", "é"] {
            assert!(
                matches!(parse_utc_offset(value), Err(ScoringError::ValidationError(_))),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        );
        assert!(matches!(
            parse_date("31.05.2024"),
            Err(ScoringError::ValidationError(_))
        ));
    }
}
