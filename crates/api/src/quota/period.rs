//! Quota periods: one UTC calendar day.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// The period `now` falls in.
pub fn period_for(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// Midnight UTC at which `period` ends.
pub fn next_period_start(period: NaiveDate) -> DateTime<Utc> {
    period
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
        .and_utc()
}
