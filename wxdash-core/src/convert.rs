//! Unit and time conversions shared by the clients and their callers.
//!
//! Everything here is a pure function; the fetch paths never convert units
//! on their own.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Timezone used when the caller doesn't specify one.
pub const DEFAULT_TZ: Tz = chrono_tz::US::Eastern;

/// Wall-clock format used for the local-time round trip.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kelvin to Fahrenheit, rounded to one decimal place.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    let f = (kelvin - 273.15) * 9.0 / 5.0 + 32.0;
    (f * 10.0).round() / 10.0
}

/// Absolute number of calendar days between two dates.
pub fn days_between(d1: NaiveDate, d2: NaiveDate) -> i64 {
    (d2 - d1).num_days().abs()
}

/// Reformat a 24-hour `HH:MM:SS` time as `hh:mm AM/PM` (seconds dropped).
pub fn format_time_of_day(hhmmss: &str) -> Result<String> {
    let time = NaiveTime::parse_from_str(hhmmss, "%H:%M:%S")
        .with_context(|| format!("Not a valid HH:MM:SS time: '{hhmmss}'"))?;
    Ok(time.format("%I:%M %p").to_string())
}

/// Parse a naive wall-clock string as local time in `tz` and return the Unix
/// timestamp. `None` means "now".
///
/// During a DST fold the earlier of the two possible instants is chosen;
/// times that fall in the spring-forward gap are an error.
pub fn local_datetime_to_unix(text: Option<&str>, format: &str, tz: Tz) -> Result<i64> {
    let naive = match text {
        Some(s) => NaiveDateTime::parse_from_str(s, format)
            .with_context(|| format!("Failed to parse '{s}' with format '{format}'"))?,
        None => Utc::now().with_timezone(&tz).naive_local(),
    };

    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("Local time {naive} does not exist in timezone {tz}"))?;

    Ok(local.timestamp())
}

/// Interpret `ts` as UTC, convert to `tz`, and format with `format`.
///
/// Exact inverse of [`local_datetime_to_unix`] for a fixed timezone and
/// format.
pub fn unix_to_local_string(ts: i64, tz: Tz, format: &str) -> Result<String> {
    let utc = Utc
        .timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| anyhow!("Unix timestamp {ts} is out of range"))?;

    Ok(utc.with_timezone(&tz).format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_fixed_points() {
        assert_eq!(kelvin_to_fahrenheit(273.15), 32.0);
        assert_eq!(kelvin_to_fahrenheit(373.15), 212.0);
    }

    #[test]
    fn kelvin_rounds_to_one_decimal() {
        // 300 K = 80.33 °F
        assert_eq!(kelvin_to_fahrenheit(300.0), 80.3);
    }

    #[test]
    fn days_between_same_date_is_zero() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(days_between(d, d), 0);
    }

    #[test]
    fn days_between_is_symmetric() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(days_between(d1, d2), days_between(d2, d1));
        assert_eq!(days_between(d1, d2), 365);
    }

    #[test]
    fn midnight_formats_as_twelve_am() {
        assert_eq!(format_time_of_day("00:00:00").unwrap(), "12:00 AM");
    }

    #[test]
    fn morning_is_am_afternoon_is_pm() {
        assert_eq!(format_time_of_day("06:45:12").unwrap(), "06:45 AM");
        assert_eq!(format_time_of_day("11:59:59").unwrap(), "11:59 AM");
        assert_eq!(format_time_of_day("12:00:00").unwrap(), "12:00 PM");
        assert_eq!(format_time_of_day("18:05:00").unwrap(), "06:05 PM");
    }

    #[test]
    fn format_time_of_day_rejects_garbage() {
        assert!(format_time_of_day("25:00:00").is_err());
        assert!(format_time_of_day("not a time").is_err());
    }

    #[test]
    fn local_unix_round_trip() {
        let original = "2024-03-01 08:30:00";
        let ts = local_datetime_to_unix(Some(original), DATETIME_FORMAT, DEFAULT_TZ).unwrap();
        let back = unix_to_local_string(ts, DEFAULT_TZ, DATETIME_FORMAT).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn local_unix_round_trip_summer_time() {
        let original = "2024-07-15 17:00:00";
        let ts = local_datetime_to_unix(Some(original), DATETIME_FORMAT, DEFAULT_TZ).unwrap();
        let back = unix_to_local_string(ts, DEFAULT_TZ, DATETIME_FORMAT).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn known_instant_converts_to_eastern() {
        // 2024-01-01 00:00:00 UTC is 19:00 the previous evening in Eastern.
        let s = unix_to_local_string(1_704_067_200, DEFAULT_TZ, DATETIME_FORMAT).unwrap();
        assert_eq!(s, "2023-12-31 19:00:00");
    }

    #[test]
    fn absent_text_means_now() {
        let before = Utc::now().timestamp();
        let ts = local_datetime_to_unix(None, DATETIME_FORMAT, DEFAULT_TZ).unwrap();
        let after = Utc::now().timestamp();
        // Seconds-resolution wall clock, so allow a second of slack each way.
        assert!(ts >= before - 1 && ts <= after + 1);
    }

    #[test]
    fn bad_wall_clock_string_is_an_error() {
        assert!(local_datetime_to_unix(Some("yesterday"), DATETIME_FORMAT, DEFAULT_TZ).is_err());
    }
}
