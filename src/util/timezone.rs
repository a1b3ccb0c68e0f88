use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use time::{Date, Month, error::ComponentRange};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Denver;

pub fn localized_datetime(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Calendar date of `instant` as observed in `tz`.
pub fn localized_date(instant: DateTime<Utc>, tz: Tz) -> Result<Date, ComponentRange> {
    let localized = localized_datetime(instant, tz);
    let month = Month::try_from(localized.month() as u8)?;
    Date::from_calendar_date(localized.year(), month, localized.day() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evening_in_denver_is_previous_utc_day() {
        let instant = DateTime::<Utc>::from_timestamp(1_699_920_000, 0).expect("timestamp");
        let date = localized_date(instant, DEFAULT_TIMEZONE).expect("date");
        assert_eq!(date.to_string(), "2023-11-13");
    }

    #[test]
    fn utc_zone_keeps_calendar_day() {
        let instant = DateTime::<Utc>::from_timestamp(1_699_920_000, 0).expect("timestamp");
        let date = localized_date(instant, chrono_tz::UTC).expect("date");
        assert_eq!(date.to_string(), "2023-11-14");
    }
}
