//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist habit configuration and denormalized streak counters.
//! - Encode the recurrence variant into flat `recurrence_*` columns.
//!
//! # Invariants
//! - A habit is only visible to its owner; lookups by another user behave
//!   exactly like a missing habit.
//! - Configuration updates never touch streak columns, and streak updates
//!   never touch configuration columns.

use super::{
    from_millis, parse_count, parse_day, parse_uuid, to_millis, RepoError, RepoResult,
};
use crate::day;
use crate::model::habit::{
    Habit, HabitId, HabitKind, Recurrence, StreakState, TimeOfDay, UserId, WeekStart,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    description,
    kind,
    color,
    icon,
    time_of_day,
    recurrence_type,
    recurrence_days,
    recurrence_interval,
    recurrence_times,
    recurrence_week_starts_on,
    streak,
    longest_streak,
    last_completed_day,
    archived,
    created_at,
    updated_at
FROM habits";

/// Repository interface for habit records.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    /// Point read scoped by owner, archived habits included.
    fn get_habit(&self, id: HabitId, user_id: UserId) -> RepoResult<Option<Habit>>;
    /// Non-archived habits, newest first.
    fn list_active_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>>;
    /// Writes configuration fields and `updated_at`.
    fn update_habit_config(&self, habit: &Habit) -> RepoResult<()>;
    /// Sets `archived = 1`. Archiving twice is not an error.
    fn archive_habit(&self, id: HabitId, user_id: UserId) -> RepoResult<()>;
    fn update_streak(&self, id: HabitId, user_id: UserId, state: &StreakState) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
///
/// Accepts a plain connection or an open transaction (via deref).
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;
        let recurrence = RecurrenceColumns::from(&habit.recurrence);

        self.conn.execute(
            "INSERT INTO habits (
                id,
                user_id,
                name,
                description,
                kind,
                color,
                icon,
                time_of_day,
                recurrence_type,
                recurrence_days,
                recurrence_interval,
                recurrence_times,
                recurrence_week_starts_on,
                streak,
                longest_streak,
                last_completed_day,
                archived,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19);",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name.as_str(),
                habit.description.as_deref(),
                habit.kind.as_str(),
                habit.color.as_deref(),
                habit.icon.as_deref(),
                time_of_day_to_db(&habit.time_of_day),
                recurrence.kind,
                recurrence.days,
                recurrence.interval,
                recurrence.times,
                recurrence.week_starts_on,
                habit.streak,
                habit.longest_streak,
                habit.last_completed_date.map(day::to_key),
                bool_to_int(habit.archived),
                to_millis(habit.created_at),
                to_millis(habit.updated_at),
            ],
        )?;

        Ok(habit.id)
    }

    fn get_habit(&self, id: HabitId, user_id: UserId) -> RepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }

        Ok(None)
    }

    fn list_active_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE user_id = ?1
               AND archived = 0
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([user_id.to_string()])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }

        Ok(habits)
    }

    fn update_habit_config(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;
        let recurrence = RecurrenceColumns::from(&habit.recurrence);

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?3,
                description = ?4,
                kind = ?5,
                color = ?6,
                icon = ?7,
                time_of_day = ?8,
                recurrence_type = ?9,
                recurrence_days = ?10,
                recurrence_interval = ?11,
                recurrence_times = ?12,
                recurrence_week_starts_on = ?13,
                updated_at = ?14
             WHERE id = ?1
               AND user_id = ?2;",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name.as_str(),
                habit.description.as_deref(),
                habit.kind.as_str(),
                habit.color.as_deref(),
                habit.icon.as_deref(),
                time_of_day_to_db(&habit.time_of_day),
                recurrence.kind,
                recurrence.days,
                recurrence.interval,
                recurrence.times,
                recurrence.week_starts_on,
                to_millis(habit.updated_at),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit.id));
        }

        Ok(())
    }

    fn archive_habit(&self, id: HabitId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                archived = 1,
                updated_at = ?3
             WHERE id = ?1
               AND user_id = ?2;",
            params![id.to_string(), user_id.to_string(), to_millis(Utc::now())],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn update_streak(&self, id: HabitId, user_id: UserId, state: &StreakState) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                streak = ?3,
                longest_streak = ?4,
                last_completed_day = ?5,
                updated_at = ?6
             WHERE id = ?1
               AND user_id = ?2;",
            params![
                id.to_string(),
                user_id.to_string(),
                state.streak,
                state.longest_streak,
                state.last_completed_date.map(day::to_key),
                to_millis(Utc::now()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// Flat column projection of one recurrence variant.
struct RecurrenceColumns {
    kind: &'static str,
    days: Option<String>,
    interval: Option<u32>,
    times: Option<u32>,
    week_starts_on: Option<u8>,
}

impl From<&Recurrence> for RecurrenceColumns {
    fn from(value: &Recurrence) -> Self {
        let mut columns = Self {
            kind: value.type_str(),
            days: None,
            interval: None,
            times: None,
            week_starts_on: None,
        };
        match value {
            Recurrence::Daily => {}
            Recurrence::Weekly { days_of_week } => {
                columns.days = Some(
                    days_of_week
                        .iter()
                        .map(u8::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                );
            }
            Recurrence::EveryNDays { interval } => columns.interval = Some(*interval),
            Recurrence::TimesPerWeek {
                times,
                week_starts_on,
            } => {
                columns.times = Some(*times);
                columns.week_starts_on = Some(week_starts_on.as_index());
            }
        }
        columns
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = kind_text
        .parse::<HabitKind>()
        .map_err(|err| RepoError::InvalidData(format!("{err} in habits.kind")))?;
    let time_of_day_text: String = row.get("time_of_day")?;
    let last_completed_date = match row.get::<_, Option<String>>("last_completed_day")? {
        Some(value) => Some(parse_day(&value, "habits.last_completed_day")?),
        None => None,
    };
    let archived = match row.get::<_, i64>("archived")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid archived value `{other}` in habits.archived"
            )));
        }
    };

    let habit = Habit {
        id: parse_uuid(&id_text, "habits.id")?,
        user_id: parse_uuid(&user_text, "habits.user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        kind,
        color: row.get("color")?,
        icon: row.get("icon")?,
        time_of_day: parse_time_of_day(&time_of_day_text)?,
        recurrence: parse_recurrence(row)?,
        streak: parse_count(row.get("streak")?, "habits.streak")?,
        longest_streak: parse_count(row.get("longest_streak")?, "habits.longest_streak")?,
        last_completed_date,
        archived,
        created_at: from_millis(row.get("created_at")?, "habits.created_at")?,
        updated_at: from_millis(row.get("updated_at")?, "habits.updated_at")?,
    };
    habit.validate()?;
    Ok(habit)
}

fn parse_recurrence(row: &Row<'_>) -> RepoResult<Recurrence> {
    let kind: String = row.get("recurrence_type")?;
    let recurrence = match kind.as_str() {
        "daily" => Recurrence::Daily,
        "weekly" => {
            let days: Option<String> = row.get("recurrence_days")?;
            Recurrence::Weekly {
                days_of_week: parse_days_of_week(days.as_deref().unwrap_or_default())?,
            }
        }
        "every_n_days" => Recurrence::EveryNDays {
            interval: required_column(row, "recurrence_interval")?,
        },
        "times_per_week" => {
            let week_start: u8 = required_column(row, "recurrence_week_starts_on")?;
            Recurrence::TimesPerWeek {
                times: required_column(row, "recurrence_times")?,
                week_starts_on: WeekStart::from_index(week_start).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid week start `{week_start}` in habits.recurrence_week_starts_on"
                    ))
                })?,
            }
        }
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid recurrence type `{other}` in habits.recurrence_type"
            )));
        }
    };
    Ok(recurrence)
}

fn required_column<T: rusqlite::types::FromSql>(row: &Row<'_>, column: &str) -> RepoResult<T> {
    row.get::<_, Option<T>>(column)?
        .ok_or_else(|| RepoError::InvalidData(format!("missing habits.{column}")))
}

fn parse_days_of_week(value: &str) -> RepoResult<BTreeSet<u8>> {
    value
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>().map_err(|_| {
                RepoError::InvalidData(format!("invalid weekday `{part}` in habits.recurrence_days"))
            })
        })
        .collect()
}

fn time_of_day_to_db(values: &[TimeOfDay]) -> String {
    values
        .iter()
        .map(|value| value.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_time_of_day(value: &str) -> RepoResult<Vec<TimeOfDay>> {
    value
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TimeOfDay>()
                .map_err(|err| RepoError::InvalidData(format!("{err} in habits.time_of_day")))
        })
        .collect()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
