//! Weekday-set contiguity.
//!
//! Only scheduled weekdays count. A success extends the run when it lands on
//! the first scheduled weekday after the last counted one, so no scheduled
//! occurrence was skipped in between.

use super::Progress;
use crate::day::{add_days, weekday_index, CanonicalDay};
use std::collections::BTreeSet;

pub fn is_scheduled(days_of_week: &BTreeSet<u8>, day: CanonicalDay) -> bool {
    days_of_week.contains(&weekday_index(day))
}

/// First scheduled day strictly after `day`, within one week.
pub fn next_scheduled_after(days_of_week: &BTreeSet<u8>, day: CanonicalDay) -> Option<CanonicalDay> {
    (1..=7)
        .filter_map(|offset| add_days(day, offset))
        .find(|candidate| is_scheduled(days_of_week, *candidate))
}

pub fn progress(
    days_of_week: &BTreeSet<u8>,
    last: Option<CanonicalDay>,
    day: CanonicalDay,
) -> Progress {
    if !is_scheduled(days_of_week, day) {
        return Progress::Unchanged;
    }
    match last {
        None => Progress::Restart,
        Some(last) if last == day => Progress::Unchanged,
        Some(last) if next_scheduled_after(days_of_week, last) == Some(day) => Progress::Extend,
        Some(_) => Progress::Restart,
    }
}
