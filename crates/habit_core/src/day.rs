//! Canonical calendar-day keys.
//!
//! # Responsibility
//! - Collapse any timestamp to its UTC calendar date.
//! - Provide the small date arithmetic the streak engine needs.
//!
//! # Invariants
//! - UTC is the only reference timezone. Every entry key and streak
//!   reference goes through [`normalize`]; mixing zones would break both the
//!   `(user, habit, day)` uniqueness key and contiguity checks.
//! - Day keys persist as `YYYY-MM-DD`, which sorts chronologically as text.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

/// A calendar day in UTC.
pub type CanonicalDay = NaiveDate;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Normalizes a timestamp in any zone to its UTC calendar day.
pub fn normalize<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> CanonicalDay {
    timestamp.with_timezone(&Utc).date_naive()
}

/// Returns midnight UTC at the start of `day`.
pub fn start_of_day(day: CanonicalDay) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Today's canonical day.
pub fn today() -> CanonicalDay {
    normalize(&Utc::now())
}

pub fn to_key(day: CanonicalDay) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

pub fn from_key(key: &str) -> Option<CanonicalDay> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}

/// `day + n` days, `None` past the calendar range.
pub fn add_days(day: CanonicalDay, n: u32) -> Option<CanonicalDay> {
    day.checked_add_days(Days::new(u64::from(n)))
}

/// Weekday number with Sunday = 0 .. Saturday = 6.
pub fn weekday_index(day: CanonicalDay) -> u8 {
    sunday_index(day.weekday())
}

/// First day of the week containing `day`.
pub fn week_start(day: CanonicalDay, first_weekday: Weekday) -> CanonicalDay {
    let offset = (7 + sunday_index(day.weekday()) - sunday_index(first_weekday)) % 7;
    day.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(day)
}

fn sunday_index(weekday: Weekday) -> u8 {
    // num_days_from_sunday is always 0..=6.
    weekday.num_days_from_sunday() as u8
}
