//! Conversions between the domain's `time` types and the `chrono` types the
//! PostgreSQL driver encodes.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use labdesk_storage::StorageError;
use time::{Date, Month, OffsetDateTime};

pub fn time_to_chrono(dt: OffsetDateTime) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
        .ok_or_else(|| StorageError::internal(format!("timestamp out of range: {dt}")))
}

pub fn chrono_to_time(dt: DateTime<Utc>) -> Result<OffsetDateTime, StorageError> {
    let nanos = dt
        .timestamp_nanos_opt()
        .ok_or_else(|| StorageError::internal(format!("timestamp out of range: {dt}")))?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|e| StorageError::internal(format!("timestamp out of range: {e}")))
}

pub fn date_to_chrono(date: Date) -> Result<NaiveDate, StorageError> {
    NaiveDate::from_ymd_opt(date.year(), u32::from(u8::from(date.month())), u32::from(date.day()))
        .ok_or_else(|| StorageError::internal(format!("date out of range: {date}")))
}

pub fn chrono_to_date(date: NaiveDate) -> Result<Date, StorageError> {
    let month = u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(|| StorageError::internal(format!("invalid month in {date}")))?;
    let day = u8::try_from(date.day())
        .map_err(|_| StorageError::internal(format!("invalid day in {date}")))?;
    Date::from_calendar_date(date.year(), month, day)
        .map_err(|e| StorageError::internal(format!("date out of range: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn timestamps_survive_the_round_trip() {
        let dt = datetime!(2024-02-29 13:45:12.123456 UTC);
        let chrono = time_to_chrono(dt).unwrap();
        assert_eq!(chrono.to_rfc3339(), "2024-02-29T13:45:12.123456+00:00");
        assert_eq!(chrono_to_time(chrono).unwrap(), dt);
    }

    #[test]
    fn dates_survive_the_round_trip() {
        let d = date!(1985 - 06 - 15);
        let chrono = date_to_chrono(d).unwrap();
        assert_eq!(chrono.to_string(), "1985-06-15");
        assert_eq!(chrono_to_date(chrono).unwrap(), d);
    }
}
