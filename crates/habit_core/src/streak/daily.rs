//! Daily contiguity: each success must land on the day after the last one.

use super::Progress;
use crate::day::{add_days, CanonicalDay};

pub fn progress(last: Option<CanonicalDay>, day: CanonicalDay) -> Progress {
    match last {
        None => Progress::Restart,
        Some(last) if last == day => Progress::Unchanged,
        Some(last) if add_days(last, 1) == Some(day) => Progress::Extend,
        Some(_) => Progress::Restart,
    }
}
