//! Authoritative timestamp resolution.
//!
//! A document's date comes from the first source that yields a value:
//!
//! | Order | Source | Accepted shapes |
//! |-------|--------|-----------------|
//! | 1 | metadata `datetime` | `YYYY-MM-DD HH:MM 00:00`, `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` |
//! | 2 | metadata `date` | `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` |
//! | 3 | file name | `YYYY-MM-DD-<title>.<ext>` |
//! | 4 | file modification time | always succeeds |
//!
//! Metadata formats are selected by exact string length. A value whose
//! length matches no format, or that fails under the format its length
//! selects, counts as absent.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const DATE_ONLY: &str = "%Y-%m-%d";
const DATE_MINUTE: &str = "%Y-%m-%d %H:%M";
const DATE_MINUTE_ZERO_OFFSET: &str = "%Y-%m-%d %H:%M 00:00";

/// Which source produced a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    DatetimeField,
    DateField,
    Filename,
    ModifiedTime,
}

/// Inputs to one date resolution.
#[derive(Debug, Clone, Copy)]
pub struct DateInputs<'a> {
    pub datetime_field: Option<&'a str>,
    pub date_field: Option<&'a str>,
    pub filename: &'a str,
    pub modified: NaiveDateTime,
}

type Strategy = fn(&DateInputs<'_>) -> Option<NaiveDateTime>;

/// Fallible sources in priority order. The modification time closes the chain.
const STRATEGIES: &[(DateSource, Strategy)] = &[
    (DateSource::DatetimeField, from_datetime_field),
    (DateSource::DateField, from_date_field),
    (DateSource::Filename, from_filename),
];

/// Resolve the authoritative timestamp for a document. Never fails.
pub fn resolve_date(
    datetime_field: Option<&str>,
    date_field: Option<&str>,
    filename: &str,
    modified: NaiveDateTime,
) -> NaiveDateTime {
    resolve_with_source(&DateInputs {
        datetime_field,
        date_field,
        filename,
        modified,
    })
    .0
}

/// Like [`resolve_date`], also reporting which source won.
pub fn resolve_with_source(inputs: &DateInputs<'_>) -> (NaiveDateTime, DateSource) {
    STRATEGIES
        .iter()
        .find_map(|(source, strategy)| strategy(inputs).map(|ts| (ts, *source)))
        .unwrap_or((inputs.modified, DateSource::ModifiedTime))
}

fn from_datetime_field(inputs: &DateInputs<'_>) -> Option<NaiveDateTime> {
    parse_metadata_timestamp(inputs.datetime_field?, true)
}

fn from_date_field(inputs: &DateInputs<'_>) -> Option<NaiveDateTime> {
    parse_metadata_timestamp(inputs.date_field?, false)
}

fn from_filename(inputs: &DateInputs<'_>) -> Option<NaiveDateTime> {
    parse_filename(inputs.filename).map(|hint| hint.date.and_time(chrono::NaiveTime::MIN))
}

/// Parse a metadata timestamp, choosing the format by length.
///
/// The 22-character `... 00:00` shape is only honoured when
/// `allow_zero_offset` is set (the `datetime` field).
pub fn parse_metadata_timestamp(value: &str, allow_zero_offset: bool) -> Option<NaiveDateTime> {
    match value.len() {
        22 if allow_zero_offset => {
            NaiveDateTime::parse_from_str(value, DATE_MINUTE_ZERO_OFFSET).ok()
        }
        16 => NaiveDateTime::parse_from_str(value, DATE_MINUTE).ok(),
        10 => NaiveDate::parse_from_str(value, DATE_ONLY)
            .ok()
            .map(|d| d.and_time(chrono::NaiveTime::MIN)),
        _ => None,
    }
}

/// Date and title recovered from a `YYYY-MM-DD-<title>.<ext>` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameHint {
    pub date: NaiveDate,
    pub title: String,
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)\.([^./\\]+)$").expect("valid filename regex")
    })
}

/// Parse a dated file name. Returns `None` when the name does not match or
/// the date portion is not a real calendar date.
pub fn parse_filename(filename: &str) -> Option<FilenameHint> {
    let caps = filename_pattern().captures(filename)?;
    let date = NaiveDate::parse_from_str(&caps[1], DATE_ONLY).ok()?;
    Some(FilenameHint {
        date,
        title: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_datetime_minute_precision() {
        let ts = resolve_date(Some("2023-05-01 14:30"), None, "x.md", mtime());
        assert_eq!(ts, ymd_hm(2023, 5, 1, 14, 30));
    }

    #[test]
    fn test_datetime_zero_offset_variant() {
        let ts = resolve_date(Some("2023-05-01 14:30 00:00"), None, "x.md", mtime());
        assert_eq!(ts, ymd_hm(2023, 5, 1, 14, 30));
    }

    #[test]
    fn test_datetime_date_only() {
        let ts = resolve_date(Some("2023-05-01"), None, "x.md", mtime());
        assert_eq!(ts, ymd_hm(2023, 5, 1, 0, 0));
    }

    #[test]
    fn test_wrong_length_is_absent() {
        let inputs = DateInputs {
            datetime_field: Some("2023-05-01T14:30:00"),
            date_field: None,
            filename: "notes.md",
            modified: mtime(),
        };
        assert_eq!(
            resolve_with_source(&inputs),
            (mtime(), DateSource::ModifiedTime)
        );
    }

    #[test]
    fn test_right_length_bad_value_falls_through() {
        let ts = resolve_date(
            Some("2023-13-01 99:99"),
            Some("2022-02-03"),
            "x.md",
            mtime(),
        );
        assert_eq!(ts, ymd_hm(2022, 2, 3, 0, 0));
    }

    #[test]
    fn test_date_field_minute_precision() {
        let inputs = DateInputs {
            datetime_field: None,
            date_field: Some("2023-05-01 14:30"),
            filename: "2021-07-08-ignored.md",
            modified: mtime(),
        };
        assert_eq!(
            resolve_with_source(&inputs),
            (ymd_hm(2023, 5, 1, 14, 30), DateSource::DateField)
        );
    }

    #[test]
    fn test_date_field_rejects_zero_offset_shape() {
        let inputs = DateInputs {
            datetime_field: None,
            date_field: Some("2023-05-01 14:30 00:00"),
            filename: "2021-07-08-fallback.md",
            modified: mtime(),
        };
        let (ts, source) = resolve_with_source(&inputs);
        assert_eq!(source, DateSource::Filename);
        assert_eq!(ts, ymd_hm(2021, 7, 8, 0, 0));
    }

    #[test]
    fn test_datetime_beats_date() {
        let inputs = DateInputs {
            datetime_field: Some("2023-05-01 08:00"),
            date_field: Some("2022-01-01"),
            filename: "2021-01-01-x.md",
            modified: mtime(),
        };
        assert_eq!(
            resolve_with_source(&inputs),
            (ymd_hm(2023, 5, 1, 8, 0), DateSource::DatetimeField)
        );
    }

    #[test]
    fn test_filename_hint() {
        let hint = parse_filename("2023-05-01-hello world.md").unwrap();
        assert_eq!(hint.date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(hint.title, "hello world");
    }

    #[test]
    fn test_filename_invalid_calendar_date() {
        assert!(parse_filename("2023-02-30-nope.md").is_none());
        assert!(parse_filename("notes.md").is_none());
        assert!(parse_filename("2023-05-01.md").is_none());
    }

    #[test]
    fn test_mtime_is_terminal() {
        assert_eq!(resolve_date(None, None, "plain.md", mtime()), mtime());
    }
}
