//! Check-in orchestration.
//!
//! # Responsibility
//! - Record one check-in: verify ownership, normalize the day, upsert the
//!   entry, run the streak engine, persist the new streak state.
//! - Serve entry reads for a habit owned by the caller.
//!
//! # Invariants
//! - The entry upsert and the streak update commit in one `IMMEDIATE`
//!   transaction, so no reader sees an entry without its streak effect.
//! - A write conflict is retried up to `max_attempts` times in total, each
//!   attempt re-reading the habit and recomputing from scratch.
//! - Status/kind mismatches and foreign habits are rejected before any write.

use crate::config::CheckInConfig;
use crate::day::{self, add_days, week_start, CanonicalDay};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::model::entry::{normalize_notes, EntryStatus, HabitEntry};
use crate::model::habit::{HabitId, Recurrence, StreakState, UserId};
use crate::model::now_millis;
use crate::repo::entry_repo::{EntryRepository, EntryUpsert, SqliteEntryRepository};
use crate::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use crate::streak::{self, EntryEvent};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::time::Instant;

/// Caller input for one check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRequest {
    pub habit_id: HabitId,
    pub user_id: UserId,
    /// Any instant on the day being checked in; only its UTC date matters.
    pub date: DateTime<Utc>,
    pub status: EntryStatus,
    pub notes: Option<String>,
}

impl CheckInRequest {
    pub fn new(
        habit_id: HabitId,
        user_id: UserId,
        date: DateTime<Utc>,
        status: EntryStatus,
    ) -> Self {
        Self {
            habit_id,
            user_id,
            date,
            status,
            notes: None,
        }
    }

    /// Check-in for a calendar day rather than an instant.
    pub fn for_day(
        habit_id: HabitId,
        user_id: UserId,
        day: CanonicalDay,
        status: EntryStatus,
    ) -> Self {
        Self::new(habit_id, user_id, day::start_of_day(day), status)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInOutcome {
    pub entry: HabitEntry,
    pub previous: StreakState,
    pub streak: StreakState,
    /// Attempts used, `1` unless a conflict was retried.
    pub attempts: u32,
}

/// `{success, message}` envelope for callers that only relay status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CheckInResponse {
    pub fn from_result(status: EntryStatus, result: &CoreResult<CheckInOutcome>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                message: Some(format!("Habit marked as {status}.")),
            },
            Err(err) => Self {
                success: false,
                message: Some(err.to_string()),
            },
        }
    }
}

/// Check-in orchestrator over one SQLite connection.
///
/// Parallel requests each use their own connection; SQLite locking makes
/// their transactions serialize.
pub struct CheckInService<'conn> {
    conn: &'conn Connection,
    max_attempts: u32,
}

impl<'conn> CheckInService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_config(conn, &CheckInConfig::default())
    }

    pub fn with_config(conn: &'conn Connection, config: &CheckInConfig) -> Self {
        Self {
            conn,
            max_attempts: config.max_attempts.max(2),
        }
    }

    /// Records a check-in and updates the habit's streak.
    pub fn record_check_in(&self, request: &CheckInRequest) -> CoreResult<CheckInOutcome> {
        let started_at = Instant::now();
        let day = day::normalize(&request.date);
        let notes = normalize_notes(request.notes.clone());

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.record_once(request, day, notes.clone()) {
                Ok(mut outcome) => {
                    outcome.attempts = attempt;
                    info!(
                        "event=checkin module=service status=ok habit_id={} entry_status={} streak={} longest={} attempts={} duration_ms={}",
                        request.habit_id,
                        request.status,
                        outcome.streak.streak,
                        outcome.streak.longest_streak,
                        attempt,
                        started_at.elapsed().as_millis()
                    );
                    return Ok(outcome);
                }
                Err(CoreError::Conflict(err)) if attempt < self.max_attempts => {
                    warn!(
                        "event=checkin module=service status=retry habit_id={} attempt={} error={}",
                        request.habit_id, attempt, err
                    );
                }
                Err(err) => {
                    let log_line = format!(
                        "event=checkin module=service status=error habit_id={} attempts={} duration_ms={} error_code={} error={}",
                        request.habit_id,
                        attempt,
                        started_at.elapsed().as_millis(),
                        err.code(),
                        err
                    );
                    if err.is_retryable() {
                        error!("{log_line}");
                    } else {
                        warn!("{log_line}");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Entries of one owned habit for `from..=to`, ascending by day.
    pub fn list_entries(
        &self,
        habit_id: HabitId,
        user_id: UserId,
        from: CanonicalDay,
        to: CanonicalDay,
    ) -> CoreResult<Vec<HabitEntry>> {
        self.ensure_owned(habit_id, user_id)?;
        Ok(SqliteEntryRepository::new(self.conn).list_entries(user_id, habit_id, from, to)?)
    }

    /// The entry of one owned habit on `day`, if any.
    pub fn get_entry(
        &self,
        habit_id: HabitId,
        user_id: UserId,
        day: CanonicalDay,
    ) -> CoreResult<Option<HabitEntry>> {
        self.ensure_owned(habit_id, user_id)?;
        Ok(SqliteEntryRepository::new(self.conn).get_entry(user_id, habit_id, day)?)
    }

    fn ensure_owned(&self, habit_id: HabitId, user_id: UserId) -> CoreResult<()> {
        match SqliteHabitRepository::new(self.conn).get_habit(habit_id, user_id)? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound(habit_id)),
        }
    }

    fn record_once(
        &self,
        request: &CheckInRequest,
        day: CanonicalDay,
        notes: Option<String>,
    ) -> CoreResult<CheckInOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = apply_check_in(
            &SqliteHabitRepository::new(&tx),
            &SqliteEntryRepository::new(&tx),
            &EntryUpsert {
                user_id: request.user_id,
                habit_id: request.habit_id,
                day,
                status: request.status,
                notes,
                recorded_at: now_millis(),
            },
        )?;
        tx.commit()?;
        Ok(outcome)
    }
}

/// Runs one check-in against repositories sharing a transaction scope.
///
/// Does not commit; the caller owns the transaction boundary.
pub fn apply_check_in<H, E>(habits: &H, entries: &E, upsert: &EntryUpsert) -> CoreResult<CheckInOutcome>
where
    H: HabitRepository,
    E: EntryRepository,
{
    let habit = habits
        .get_habit(upsert.habit_id, upsert.user_id)?
        .ok_or(CoreError::NotFound(upsert.habit_id))?;
    if !habit.kind.accepts(upsert.status) {
        return Err(ValidationError::StatusNotAllowed {
            kind: habit.kind,
            status: upsert.status,
        }
        .into());
    }

    let entry = entries.upsert_entry(upsert)?;

    let mut event = EntryEvent::new(entry.date, entry.status);
    if let Recurrence::TimesPerWeek { week_starts_on, .. } = habit.recurrence {
        let from = week_start(entry.date, week_starts_on.weekday());
        let to = add_days(from, 6).unwrap_or(entry.date);
        let successes = entries.count_entries_with_status(
            upsert.user_id,
            upsert.habit_id,
            habit.kind.success_status(),
            from,
            to,
        )?;
        event = event.with_successes_in_week(successes);
    }

    let previous = habit.streak_state();
    let next = streak::apply_entry(&habit, &event);
    if next != previous {
        habits.update_streak(habit.id, habit.user_id, &next)?;
    }

    Ok(CheckInOutcome {
        entry,
        previous,
        streak: next,
        attempts: 1,
    })
}
