use crate::error::{CoreError, Result};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Current instant in UTC, truncated to microseconds so it survives a
/// round-trip through PostgreSQL `timestamptz` unchanged.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let micros = now.microsecond();
    now.replace_microsecond(micros).unwrap_or(now)
}

/// Parses a calendar date given either as `YYYY-MM-DD` or as an RFC 3339
/// timestamp (the date part is kept).
pub fn parse_date(value: &str) -> Result<Date> {
    let value = value.trim();
    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(value, &date_only) {
        return Ok(date);
    }
    OffsetDateTime::parse(value, &Rfc3339)
        .map(|dt| dt.date())
        .map_err(|e| CoreError::invalid_date(format!("'{value}': {e}")))
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    let date_only = format_description!("[year]-[month]-[day]");
    date.format(&date_only).unwrap_or_else(|_| date.to_string())
}

/// Serde adapter for dates rendered as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }
}
