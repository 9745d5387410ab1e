//! Wall-clock schedule for a recurring job.
//!
//! A [`ScheduleSpec`] names a time of day (plus a whole-day offset from
//! "today") and the fixed period between firings. It carries no behaviour;
//! the server's scheduler turns it into concrete instants.

use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

/// Largest accepted `day_offset`. Keeps date arithmetic far from chrono's limits.
pub const MAX_DAY_OFFSET: u32 = 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{field} must be in 0..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("period must be greater than zero")]
    ZeroPeriod,
}

/// Immutable schedule: fire at `time_of_day` on `today + day_offset`, then
/// every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpec {
    day_offset: u32,
    time_of_day: NaiveTime,
    period: Duration,
}

impl ScheduleSpec {
    /// The reference cadence: once every 24 hours.
    pub const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Builds a daily schedule from calendar fields.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::OutOfRange`] if any field lies outside its
    /// natural calendar range or `day_offset` exceeds [`MAX_DAY_OFFSET`].
    pub fn new(
        day_offset: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Self, ScheduleError> {
        check_range("day_offset", day_offset, MAX_DAY_OFFSET)?;
        check_range("hour", hour, 23)?;
        check_range("minute", minute, 59)?;
        check_range("second", second, 59)?;
        check_range("millisecond", millisecond, 999)?;

        let time_of_day = NaiveTime::from_hms_milli_opt(hour, minute, second, millisecond).ok_or(
            ScheduleError::OutOfRange {
                field: "time_of_day",
                value: hour,
                max: 23,
            },
        )?;

        Ok(Self {
            day_offset,
            time_of_day,
            period: Self::DAILY,
        })
    }

    /// Returns a copy of this schedule with a different period.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::ZeroPeriod`] for a zero-length period.
    pub fn with_period(self, period: Duration) -> Result<Self, ScheduleError> {
        if period.is_zero() {
            return Err(ScheduleError::ZeroPeriod);
        }
        Ok(Self { period, ..self })
    }

    #[must_use]
    pub fn day_offset(&self) -> u32 {
        self.day_offset
    }

    #[must_use]
    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<(), ScheduleError> {
    if value > max {
        return Err(ScheduleError::OutOfRange { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_daily_schedule() {
        let spec = ScheduleSpec::new(1, 2, 30, 15, 250).expect("valid spec");
        assert_eq!(spec.day_offset(), 1);
        assert_eq!(
            spec.time_of_day(),
            NaiveTime::from_hms_milli_opt(2, 30, 15, 250).unwrap()
        );
        assert_eq!(spec.period(), Duration::from_secs(86_400));
    }

    #[test]
    fn new_accepts_upper_bounds() {
        assert!(ScheduleSpec::new(MAX_DAY_OFFSET, 23, 59, 59, 999).is_ok());
    }

    #[test]
    fn new_rejects_out_of_range_hour() {
        let err = ScheduleSpec::new(0, 24, 0, 0, 0).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::OutOfRange {
                field: "hour",
                value: 24,
                max: 23
            }
        );
    }

    #[test]
    fn new_rejects_out_of_range_millisecond() {
        let err = ScheduleSpec::new(0, 0, 0, 0, 1_000).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::OutOfRange {
                field: "millisecond",
                ..
            }
        ));
    }

    #[test]
    fn new_rejects_huge_day_offset() {
        let err = ScheduleSpec::new(MAX_DAY_OFFSET + 1, 0, 0, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::OutOfRange {
                field: "day_offset",
                ..
            }
        ));
    }

    #[test]
    fn with_period_overrides_cadence() {
        let spec = ScheduleSpec::new(0, 0, 0, 0, 0)
            .unwrap()
            .with_period(Duration::from_millis(50))
            .unwrap();
        assert_eq!(spec.period(), Duration::from_millis(50));
        assert_eq!(spec.day_offset(), 0);
    }

    #[test]
    fn with_period_rejects_zero() {
        let spec = ScheduleSpec::new(0, 0, 0, 0, 0).unwrap();
        assert_eq!(
            spec.with_period(Duration::ZERO).unwrap_err(),
            ScheduleError::ZeroPeriod
        );
    }
}
