//! Streak engine.
//!
//! # Responsibility
//! - Compute the next [`StreakState`] for a habit from one recorded entry.
//! - Dispatch contiguity rules per recurrence variant.
//!
//! # Invariants
//! - Pure: no I/O, no clock reads.
//! - Re-applying a success on `last_completed_date` is a no-op. This is the
//!   guard against duplicate concurrent check-ins and must stay exact.
//! - `longest_streak` never decreases and is always `>= streak`.
//! - A failure that counts sets `streak = 0` and leaves `last_completed_date`
//!   and `longest_streak` untouched. Failures on unscheduled weekly days,
//!   before an interval is due, or under a weekly quota are neutral.

use crate::day::CanonicalDay;
use crate::model::entry::EntryStatus;
use crate::model::habit::{Habit, HabitKind, Recurrence, StreakState};

pub mod daily;
pub mod every_n_days;
pub mod times_per_week;
pub mod weekly;

/// One recorded entry as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryEvent {
    pub day: CanonicalDay,
    pub status: EntryStatus,
    /// Distinct successful days in the week containing `day`, this entry
    /// included. Only read by `times_per_week`.
    pub successes_in_week: u32,
}

impl EntryEvent {
    pub fn new(day: CanonicalDay, status: EntryStatus) -> Self {
        Self {
            day,
            status,
            successes_in_week: 0,
        }
    }

    pub fn with_successes_in_week(mut self, successes: u32) -> Self {
        self.successes_in_week = successes;
        self
    }
}

/// What a status means for a given habit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Success,
    Failure,
    /// `skipped`, or a status that belongs to the other habit kind.
    Neutral,
}

/// Effect of a success on the current run, decided by a recurrence strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Already counted, not scheduled, or not yet due.
    Unchanged,
    /// Next expected occurrence: the run grows by one.
    Extend,
    /// First success, a gap, or a backdated day: a new run of one.
    Restart,
}

pub fn classify(kind: HabitKind, status: EntryStatus) -> Signal {
    if status == kind.success_status() {
        Signal::Success
    } else if status == kind.failure_status() {
        Signal::Failure
    } else {
        Signal::Neutral
    }
}

/// Computes the habit's streak state after `event`.
pub fn apply_entry(habit: &Habit, event: &EntryEvent) -> StreakState {
    apply(habit.kind, &habit.recurrence, habit.streak_state(), event)
}

/// Computes the next streak state from raw parts.
pub fn apply(
    kind: HabitKind,
    recurrence: &Recurrence,
    state: StreakState,
    event: &EntryEvent,
) -> StreakState {
    match classify(kind, event.status) {
        Signal::Neutral => state,
        Signal::Failure => {
            if counts_failure(recurrence, state.last_completed_date, event.day) {
                StreakState { streak: 0, ..state }
            } else {
                state
            }
        }
        Signal::Success => {
            let progress = success_progress(recurrence, state.last_completed_date, event);
            advance(state, event.day, progress)
        }
    }
}

fn success_progress(
    recurrence: &Recurrence,
    last: Option<CanonicalDay>,
    event: &EntryEvent,
) -> Progress {
    match recurrence {
        Recurrence::Daily => daily::progress(last, event.day),
        Recurrence::Weekly { days_of_week } => weekly::progress(days_of_week, last, event.day),
        Recurrence::EveryNDays { interval } => every_n_days::progress(*interval, last, event.day),
        Recurrence::TimesPerWeek {
            times,
            week_starts_on,
        } => times_per_week::progress(
            *times,
            *week_starts_on,
            last,
            event.day,
            event.successes_in_week,
        ),
    }
}

/// Whether a failure on `day` breaks the run.
///
/// Weekly quotas are judged per week by the success path, so a single failed
/// day never breaks them.
fn counts_failure(recurrence: &Recurrence, last: Option<CanonicalDay>, day: CanonicalDay) -> bool {
    match recurrence {
        Recurrence::Daily => true,
        Recurrence::Weekly { days_of_week } => weekly::is_scheduled(days_of_week, day),
        Recurrence::EveryNDays { interval } => every_n_days::is_due(*interval, last, day),
        Recurrence::TimesPerWeek { .. } => false,
    }
}

fn advance(state: StreakState, day: CanonicalDay, progress: Progress) -> StreakState {
    let streak = match progress {
        Progress::Unchanged => return state,
        Progress::Extend => state.streak.saturating_add(1),
        Progress::Restart => 1,
    };
    StreakState {
        streak,
        longest_streak: state.longest_streak.max(streak),
        last_completed_date: Some(day),
    }
}
