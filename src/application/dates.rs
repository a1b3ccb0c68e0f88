//! Frontmatter date normalisation.
//!
//! `pubDate` and `editDate` arrive as raw timestamps and leave as en-US long
//! dates ("November 14, 2023") computed in a fixed anchor timezone, so the
//! output never depends on the timezone of the machine running the build.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;
use time::{Date, format_description::FormatItem, macros::format_description};

use crate::domain::frontmatter::Frontmatter;
use crate::util::timezone::{DEFAULT_TIMEZONE, localized_date};

pub const PUB_DATE_FIELD: &str = "pubDate";
pub const EDIT_DATE_FIELD: &str = "editDate";
pub const DATE_FIELDS: [&str; 2] = [PUB_DATE_FIELD, EDIT_DATE_FIELD];

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("`{field}` holds `{value}`, which is not a valid date value")]
    InvalidDateValue { field: String, value: String },
}

impl DateError {
    fn invalid(field: &str, value: &Value) -> Self {
        Self::InvalidDateValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Formats instants as en-US long dates in one anchor timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormatter {
    timezone: Tz,
}

impl DateFormatter {
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn format(&self, instant: DateTime<Utc>) -> Option<String> {
        let date = localized_date(instant, self.timezone).ok()?;
        format_human_date(date)
    }

    /// Format a raw frontmatter value.
    ///
    /// `Ok(None)` means the value is falsy (`null`, `false`, `0`, `""`) and the
    /// field must be left untouched.
    pub fn format_value(&self, field: &str, value: &Value) -> Result<Option<String>, DateError> {
        if is_falsy(value) {
            return Ok(None);
        }

        let instant = parse_timestamp(value).ok_or_else(|| DateError::invalid(field, value))?;
        self.format(instant)
            .map(Some)
            .ok_or_else(|| DateError::invalid(field, value))
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

#[derive(Debug, Error)]
pub enum DateConfigError {
    #[error("date formatter already configured")]
    AlreadyConfigured,
}

static DATE_FORMATTER: OnceCell<DateFormatter> = OnceCell::new();

/// Fix the process-wide formatter's anchor timezone. Must run before the
/// first call to [`date_formatter`].
pub fn configure_date_formatter(timezone: Tz) -> Result<(), DateConfigError> {
    DATE_FORMATTER
        .set(DateFormatter::new(timezone))
        .map_err(|_| DateConfigError::AlreadyConfigured)
}

/// Shared formatter, initialised on first use.
pub fn date_formatter() -> &'static DateFormatter {
    DATE_FORMATTER.get_or_init(DateFormatter::default)
}

pub fn format_human_date(date: Date) -> Option<String> {
    date.format(HUMAN_DATE_FORMAT).ok()
}

/// Interpret a frontmatter value as an instant: epoch milliseconds for
/// numbers, RFC 3339 or naive (UTC) datetimes or bare dates (UTC midnight)
/// for strings.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            let millis = match number.as_i64() {
                Some(millis) => millis,
                None => {
                    let float = number.as_f64()?;
                    if !float.is_finite() || float.abs() >= i64::MAX as f64 {
                        return None;
                    }
                    float.trunc() as i64
                }
            };
            DateTime::<Utc>::from_timestamp_millis(millis)
        }
        Value::String(text) => parse_timestamp_str(text.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, DATE_ONLY_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Rewrite the date fields of `frontmatter` in place.
///
/// Both fields are resolved before either is written, so a failure leaves
/// the mapping untouched.
pub fn normalize_dates(
    frontmatter: &mut Frontmatter,
    formatter: &DateFormatter,
) -> Result<(), DateError> {
    let mut replacements = Vec::with_capacity(DATE_FIELDS.len());

    for field in DATE_FIELDS {
        let Some(value) = frontmatter.get(field) else {
            continue;
        };
        if let Some(formatted) = formatter.format_value(field, value)? {
            replacements.push((field, formatted));
        }
    }

    for (field, formatted) in replacements {
        frontmatter.insert(field, Value::String(formatted));
    }

    Ok(())
}

/// Copy of `frontmatter` with normalised date fields.
pub fn normalized_dates(
    frontmatter: &Frontmatter,
    formatter: &DateFormatter,
) -> Result<Frontmatter, DateError> {
    let mut copy = frontmatter.clone();
    normalize_dates(&mut copy, formatter)?;
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frontmatter(value: Value) -> Frontmatter {
        match value {
            Value::Object(map) => Frontmatter::from(map),
            _ => panic!("frontmatter fixture must be an object"),
        }
    }

    #[test]
    fn epoch_millis_format_in_mountain_time() {
        let formatter = DateFormatter::default();
        let formatted = formatter
            .format_value(PUB_DATE_FIELD, &json!(1_700_000_000_000_i64))
            .expect("valid");
        assert_eq!(formatted.as_deref(), Some("November 14, 2023"));
    }

    #[test]
    fn summer_dates_follow_daylight_saving_offset() {
        let formatter = DateFormatter::default();
        let formatted = formatter
            .format_value(PUB_DATE_FIELD, &json!(1_688_169_600_000_i64))
            .expect("valid");
        assert_eq!(formatted.as_deref(), Some("June 30, 2023"));
    }

    #[test]
    fn bare_dates_are_utc_midnight() {
        let formatter = DateFormatter::default();
        let formatted = formatter
            .format_value(PUB_DATE_FIELD, &json!("2023-11-14"))
            .expect("valid");
        assert_eq!(formatted.as_deref(), Some("November 13, 2023"));

        let utc = DateFormatter::new(chrono_tz::UTC);
        let formatted = utc
            .format_value(PUB_DATE_FIELD, &json!("2023-11-14"))
            .expect("valid");
        assert_eq!(formatted.as_deref(), Some("November 14, 2023"));
    }

    #[test]
    fn rfc3339_and_naive_datetimes_are_accepted() {
        let formatter = DateFormatter::default();
        for raw in [
            "2023-11-14T12:00:00Z",
            "2023-11-14T05:00:00-07:00",
            "2023-11-14T12:00:00",
            "2023-11-14 12:00:00.250",
        ] {
            let formatted = formatter
                .format_value(PUB_DATE_FIELD, &json!(raw))
                .expect("valid");
            assert_eq!(formatted.as_deref(), Some("November 14, 2023"), "{raw}");
        }
    }

    #[test]
    fn fractional_epochs_truncate() {
        let formatter = DateFormatter::default();
        let formatted = formatter
            .format_value(PUB_DATE_FIELD, &json!(1_700_000_000_000.9_f64))
            .expect("valid");
        assert_eq!(formatted.as_deref(), Some("November 14, 2023"));
    }

    #[test]
    fn falsy_values_are_skipped() {
        let formatter = DateFormatter::default();
        for value in [json!(null), json!(false), json!(0), json!("")] {
            assert_eq!(
                formatter.format_value(PUB_DATE_FIELD, &value).expect("skip"),
                None
            );
        }
    }

    #[test]
    fn non_timestamps_are_rejected() {
        let formatter = DateFormatter::default();
        for value in [
            json!(true),
            json!("next tuesday"),
            json!(["2023-11-14"]),
            json!({"year": 2023}),
            json!(i64::MAX),
        ] {
            let err = formatter
                .format_value(EDIT_DATE_FIELD, &value)
                .expect_err("invalid");
            assert!(matches!(
                err,
                DateError::InvalidDateValue { ref field, .. } if field == EDIT_DATE_FIELD
            ));
        }
    }

    #[test]
    fn formatted_output_is_not_accepted_again() {
        let formatter = DateFormatter::default();
        let mut fm = frontmatter(json!({ "pubDate": 1_700_000_000_000_i64 }));
        normalize_dates(&mut fm, &formatter).expect("first pass");

        let err = normalize_dates(&mut fm, &formatter).expect_err("second pass");
        assert!(matches!(err, DateError::InvalidDateValue { .. }));
        assert_eq!(fm.get_str(PUB_DATE_FIELD), Some("November 14, 2023"));
    }

    #[test]
    fn documents_without_date_fields_are_unchanged() {
        let formatter = DateFormatter::default();
        let original = frontmatter(json!({ "title": "Hello", "date": "2023-11-14", "draft": true }));
        let mut fm = original.clone();

        normalize_dates(&mut fm, &formatter).expect("no-op");
        assert_eq!(fm, original);
    }

    #[test]
    fn both_fields_are_rewritten_and_others_untouched() {
        let formatter = DateFormatter::default();
        let mut fm = frontmatter(json!({
            "title": "Hello",
            "pubDate": 1_700_000_000_000_i64,
            "editDate": "2024-02-29T18:00:00Z",
            "tags": ["rust"],
        }));

        normalize_dates(&mut fm, &formatter).expect("normalize");

        assert_eq!(fm.get_str("pubDate"), Some("November 14, 2023"));
        assert_eq!(fm.get_str("editDate"), Some("February 29, 2024"));
        assert_eq!(fm.get_str("title"), Some("Hello"));
        assert_eq!(fm.get("tags"), Some(&json!(["rust"])));
        let keys: Vec<_> = fm.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["title", "pubDate", "editDate", "tags"]);
    }

    #[test]
    fn failure_leaves_frontmatter_untouched() {
        let formatter = DateFormatter::default();
        let original = frontmatter(json!({
            "pubDate": 1_700_000_000_000_i64,
            "editDate": "not a date",
        }));
        let mut fm = original.clone();

        let err = normalize_dates(&mut fm, &formatter).expect_err("invalid edit date");
        assert!(matches!(
            err,
            DateError::InvalidDateValue { ref field, .. } if field == EDIT_DATE_FIELD
        ));
        assert_eq!(fm, original);
    }

    #[test]
    fn normalized_dates_returns_a_copy() {
        let formatter = DateFormatter::default();
        let original = frontmatter(json!({ "editDate": 1_700_000_000_000_i64 }));

        let normalized = normalized_dates(&original, &formatter).expect("normalize");

        assert_eq!(normalized.get_str("editDate"), Some("November 14, 2023"));
        assert_eq!(original.get("editDate"), Some(&json!(1_700_000_000_000_i64)));
    }

    #[test]
    fn falsy_date_field_is_left_in_place() {
        let formatter = DateFormatter::default();
        let original = frontmatter(json!({ "pubDate": null, "editDate": 0 }));
        let mut fm = original.clone();

        normalize_dates(&mut fm, &formatter).expect("skip");
        assert_eq!(fm, original);
    }
}
