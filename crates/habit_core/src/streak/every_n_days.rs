//! Interval contiguity: the next success is due exactly `interval` days
//! after the last one.
//!
//! A success before the due day leaves the run alone rather than breaking
//! it; the due day still extends it.

use super::Progress;
use crate::day::{add_days, CanonicalDay};

/// Whether an occurrence is expected on `day`: nothing counted yet, or the
/// interval since `last` has elapsed.
pub fn is_due(interval: u32, last: Option<CanonicalDay>, day: CanonicalDay) -> bool {
    match last {
        None => true,
        Some(last) => add_days(last, interval).is_some_and(|due| day >= due),
    }
}

pub fn progress(interval: u32, last: Option<CanonicalDay>, day: CanonicalDay) -> Progress {
    let Some(last) = last else {
        return Progress::Restart;
    };
    if day == last {
        return Progress::Unchanged;
    }

    let due = add_days(last, interval);
    if due == Some(day) {
        return Progress::Extend;
    }

    let not_yet_due = day > last && due.map_or(true, |due| day < due);
    if not_yet_due {
        Progress::Unchanged
    } else {
        Progress::Restart
    }
}
