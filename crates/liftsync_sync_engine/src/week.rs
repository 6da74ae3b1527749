//! Sunday-anchored week arithmetic.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

/// The Sunday starting the local week that contains `at`.
pub fn week_start<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    let date = at.date_naive();
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}
