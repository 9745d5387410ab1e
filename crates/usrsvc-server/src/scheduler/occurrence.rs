//! Next-occurrence arithmetic for a [`ScheduleSpec`].

use std::time::Duration;

use chrono::{
    DateTime, Days, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone,
};
use usrsvc_core::ScheduleSpec;

/// Timestamp format used in scheduler log records.
pub const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A concrete firing instant and the signed delay from "now" until it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<Tz: TimeZone> {
    pub at: DateTime<Tz>,
    /// Negative when the target already lies in the past.
    pub delay: TimeDelta,
}

impl<Tz: TimeZone> Occurrence<Tz> {
    /// How long to sleep before firing. A past target yields zero: fire now.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.delay.to_std().unwrap_or(Duration::ZERO)
    }
}

/// Computes `now`'s calendar date plus `spec.day_offset()` days, at
/// `spec.time_of_day()`, in `now`'s timezone.
///
/// No roll-forward is applied: with a zero day offset and a time of day that
/// has already passed, the returned delay is negative.
#[must_use]
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, spec: &ScheduleSpec) -> Occurrence<Tz> {
    // ScheduleSpec caps day_offset well below chrono's date range.
    let date = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(spec.day_offset())))
        .unwrap_or(NaiveDate::MAX);
    let naive = date.and_time(spec.time_of_day());
    let at = resolve_local(&now.timezone(), naive, now.offset().fix());
    let delay = at.clone().signed_duration_since(now.clone());

    Occurrence { at, delay }
}

/// Formats an instant for log records, e.g. `2024-03-02 00:00:00.000`.
#[must_use]
pub fn format_instant<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(INSTANT_FORMAT).to_string()
}

fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    offset_at_now: FixedOffset,
) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Wall-clock time skipped by a forward transition: read it with the
        // offset in force at `now`, which lands just past the gap.
        LocalResult::None => {
            let shift = TimeDelta::seconds(i64::from(offset_at_now.local_minus_utc()));
            let utc = naive.checked_sub_signed(shift).unwrap_or(naive);
            tz.from_utc_datetime(&utc)
        }
    }
}
