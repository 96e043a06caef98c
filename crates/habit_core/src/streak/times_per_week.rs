//! Weekly quota: the streak counts consecutive weeks with at least `times`
//! successful days.
//!
//! The run advances once per week, on the success that brings the week to
//! its quota; `last_completed_date` then falls inside that week.

use super::Progress;
use crate::day::{add_days, week_start, CanonicalDay};
use crate::model::habit::WeekStart;

pub fn progress(
    times: u32,
    week_starts_on: WeekStart,
    last: Option<CanonicalDay>,
    day: CanonicalDay,
    successes_in_week: u32,
) -> Progress {
    if successes_in_week < times {
        return Progress::Unchanged;
    }

    let first_weekday = week_starts_on.weekday();
    let week = week_start(day, first_weekday);
    let Some(last) = last else {
        return Progress::Restart;
    };

    let last_week = week_start(last, first_weekday);
    if last_week == week {
        Progress::Unchanged
    } else if add_days(last_week, 7) == Some(week) {
        Progress::Extend
    } else {
        Progress::Restart
    }
}
