//! Epoch helpers on top of `satkit::Instant`
//!
//! The simulation works in UTC calendar terms on input and output, and in
//! plain seconds for every offset in between.

use chrono::NaiveDate;
use satkit::{Duration, Instant};

use crate::error::{SimError, SimResult};

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time scales accepted for the scenario start epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScale {
    Utc,
}

impl TimeScale {
    pub fn parse(text: &str) -> SimResult<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "UTC" => Ok(Self::Utc),
            other => Err(SimError::config(
                "SimTimeScale",
                format!("unsupported time scale '{}'", other),
            )),
        }
    }
}

/// Build an epoch from calendar fields, checking field ranges first
pub fn epoch_from_calendar(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: f64,
    scale: TimeScale,
) -> SimResult<Instant> {
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(SimError::config(
            "SimStartDay",
            format!("{}-{:02}-{:02} is not a calendar date", year, month, day),
        ));
    }
    if hour > 23 {
        return Err(SimError::config("SimStartHour", format!("{} out of range", hour)));
    }
    if minute > 59 {
        return Err(SimError::config(
            "SimStartMinute",
            format!("{} out of range", minute),
        ));
    }
    if !second.is_finite() || !(0.0..60.0).contains(&second) {
        return Err(SimError::config(
            "SimStartSecond",
            format!("{} out of range", second),
        ));
    }

    match scale {
        TimeScale::Utc => Instant::from_datetime(
            year,
            month as i32,
            day as i32,
            hour as i32,
            minute as i32,
            second,
        )
        .map_err(|e| SimError::config("SimStartYear", format!("{}", e))),
    }
}

/// Epoch shifted by a number of seconds
pub fn shifted(epoch: &Instant, seconds: f64) -> Instant {
    *epoch + Duration::from_seconds(seconds)
}

/// Signed duration `later - earlier` in seconds
pub fn seconds_between(later: &Instant, earlier: &Instant) -> f64 {
    (*later - *earlier).as_seconds()
}

/// Render an epoch as `day Mon year hh:mm:ss.sss`, e.g. `1 Jan 2020 00:00:00.000`
///
/// Seconds are rounded to the millisecond before rendering so the carry
/// propagates into minutes, hours and the date.
pub fn format_utcg(epoch: &Instant) -> String {
    let (year, month, day, hour, minute, second) = epoch.as_datetime();
    let millis = (second * 1000.0).round() as i64;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, 0))
        .map(|base| {
            (base + chrono::Duration::milliseconds(millis))
                .format("%-d %b %Y %H:%M:%S%.3f")
                .to_string()
        })
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_start_of_year() {
        let epoch = epoch_from_calendar(2020, 1, 1, 0, 0, 0.0, TimeScale::Utc).unwrap();
        assert_eq!(format_utcg(&epoch), "1 Jan 2020 00:00:00.000");
    }

    #[test]
    fn test_format_carries_rounded_milliseconds() {
        let epoch = epoch_from_calendar(2020, 12, 31, 23, 59, 59.9996, TimeScale::Utc).unwrap();
        assert_eq!(format_utcg(&epoch), "1 Jan 2021 00:00:00.000");
    }

    #[test]
    fn test_format_fractional_seconds() {
        let epoch = epoch_from_calendar(2021, 7, 14, 9, 5, 3.25, TimeScale::Utc).unwrap();
        assert_eq!(format_utcg(&epoch), "14 Jul 2021 09:05:03.250");
    }

    #[test]
    fn test_shift_and_difference() {
        let start = epoch_from_calendar(2020, 1, 1, 0, 0, 0.0, TimeScale::Utc).unwrap();
        let later = shifted(&start, 5400.5);
        assert!((seconds_between(&later, &start) - 5400.5).abs() < 1e-6);
        assert!((seconds_between(&start, &later) + 5400.5).abs() < 1e-6);
        assert!(later > start);
    }

    #[test]
    fn test_rejects_invalid_calendar_fields() {
        assert!(epoch_from_calendar(2020, 2, 30, 0, 0, 0.0, TimeScale::Utc).is_err());
        assert!(epoch_from_calendar(2020, 1, 1, 24, 0, 0.0, TimeScale::Utc).is_err());
        assert!(epoch_from_calendar(2020, 1, 1, 0, 0, 60.0, TimeScale::Utc).is_err());
    }

    #[test]
    fn test_time_scale_parse() {
        assert_eq!(TimeScale::parse("utc").unwrap(), TimeScale::Utc);
        assert!(matches!(
            TimeScale::parse("TAI"),
            Err(SimError::Config { .. })
        ));
    }
}
