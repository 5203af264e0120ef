use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::resolve_local;

/// A half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Every reporting window for a single "now", computed once so that all
/// buckets of one report agree with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindows {
    pub today: Window,
    pub yesterday: Window,
    /// Monday 00:00 to the following Monday
    pub week: Window,
    pub last_week: Window,
    pub month: Window,
    /// `YYYY-MM-DD` of today in the caller's zone
    pub today_key: String,
    /// `YYYY-MM` of today in the caller's zone
    pub month_key: String,
}

impl ReportWindows {
    pub fn new<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        // Sunday belongs to the week that started six days earlier
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let month_start = today.with_day(1).unwrap_or(today);
        let next_month_start = first_of_next_month(month_start);

        let window = |from: NaiveDate, to: NaiveDate| Window {
            start: local_midnight(&tz, from),
            end: local_midnight(&tz, to),
        };

        Self {
            today: window(today, today + Duration::days(1)),
            yesterday: window(today - Duration::days(1), today),
            week: window(week_start, week_start + Duration::days(7)),
            last_week: window(week_start - Duration::days(7), week_start),
            month: window(month_start, next_month_start),
            today_key: today.format("%Y-%m-%d").to_string(),
            month_key: today.format("%Y-%m").to_string(),
        }
    }
}

fn first_of_next_month(month_start: NaiveDate) -> NaiveDate {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(month_start + Duration::days(31))
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    resolve_local(tz, midnight).unwrap_or_else(|| midnight.and_utc())
}

/// Month key (`YYYY-MM`) of an instant as seen from `tz`.
pub fn month_key_in<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant
        .with_timezone(tz)
        .naive_local()
        .format("%Y-%m")
        .to_string()
}
