//! Parsing of user-supplied timestamps for modification-time filters.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use std::time::SystemTime;

/// Formats tried in order when no list is configured. Times are local.
///
/// Two-digit years come first: `%Y` also accepts a short year, so `24/03/01` would
/// otherwise parse as the year 24.
pub const DEFAULT_FORMATS: &[&str] = &[
    "%y/%m/%d %H:%M:%S",
    "%y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M%S%6f",
];

/// Errors that can occur while parsing a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// No configured format accepted the input.
    Unrecognized { input: String },
    /// The input names a local time that does not exist (e.g. inside a DST gap).
    NonexistentLocalTime { input: String },
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrecognized { input } => {
                write!(f, "'{}' did not match any accepted timestamp format", input)
            }
            Self::NonexistentLocalTime { input } => {
                write!(f, "'{}' is not a valid local time", input)
            }
        }
    }
}

impl std::error::Error for TimestampError {}

/// Parses `input` with the first matching format from `formats`.
///
/// A bare `YYYY-MM-DD` date is also accepted and means local midnight.
///
/// # Examples
///
/// ```
/// use treemirror::timestamp::{DEFAULT_FORMATS, parse_timestamp};
///
/// let since = parse_timestamp("2024-03-01 08:30:00", DEFAULT_FORMATS)?;
/// assert!(since > std::time::UNIX_EPOCH);
/// # Ok::<(), treemirror::timestamp::TimestampError>(())
/// ```
pub fn parse_timestamp<S: AsRef<str>>(
    input: &str,
    formats: &[S],
) -> Result<SystemTime, TimestampError> {
    let input = input.trim();
    let naive = formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt.as_ref()).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TimestampError::Unrecognized {
            input: input.to_string(),
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(SystemTime::from)
        .ok_or_else(|| TimestampError::NonexistentLocalTime {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SystemTime {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        SystemTime::from(Local.from_local_datetime(&naive).earliest().unwrap())
    }

    #[test]
    fn test_parses_every_default_style() {
        let expected = local(2024, 3, 1, 8, 30, 15);
        for input in [
            "2024/03/01 08:30:15",
            "2024-03-01 08:30:15",
            "24/03/01 08:30:15",
            "20240301083015",
        ] {
            assert_eq!(parse_timestamp(input, DEFAULT_FORMATS), Ok(expected), "{input}");
        }
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        let whole = local(2024, 3, 1, 8, 30, 15);
        let fractional = parse_timestamp("2024-03-01 08:30:15.250000", DEFAULT_FORMATS).unwrap();
        assert_eq!(
            fractional.duration_since(whole).unwrap().as_millis(),
            250
        );
    }

    #[test]
    fn test_date_only_means_midnight() {
        assert_eq!(
            parse_timestamp("2023-12-31", DEFAULT_FORMATS),
            Ok(local(2023, 12, 31, 0, 0, 0))
        );
    }

    #[test]
    fn test_custom_formats_replace_defaults() {
        let formats = vec!["%d.%m.%Y %H:%M".to_string()];
        assert_eq!(
            parse_timestamp("01.03.2024 08:30", &formats),
            Ok(local(2024, 3, 1, 8, 30, 0))
        );
        assert!(parse_timestamp("2024/03/01 08:30:15", &formats).is_err());
    }

    #[test]
    fn test_garbage_is_unrecognized() {
        let err = parse_timestamp("yesterday", DEFAULT_FORMATS).unwrap_err();
        assert_eq!(
            err,
            TimestampError::Unrecognized {
                input: "yesterday".to_string()
            }
        );
    }
}
