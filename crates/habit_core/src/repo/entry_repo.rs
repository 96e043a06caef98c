//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert the single check-in entry per `(user_id, habit_id, day)`.
//! - Serve ordered, inclusive day-range reads.
//!
//! # Invariants
//! - Upsert is one statement guarded by the table's unique key: concurrent
//!   writers for the same key leave exactly one row, last writer wins on
//!   `status`/`notes`, and `created_at` keeps the first writer's value.
//! - Range reads are sorted by `day ASC` and are stable absent new writes.
//! - Ownership is not checked here; callers verify the habit first.

use super::{from_millis, parse_count, parse_day, parse_uuid, to_millis, RepoError, RepoResult};
use crate::day::{self, CanonicalDay};
use crate::model::entry::{EntryStatus, HabitEntry};
use crate::model::habit::{HabitId, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const ENTRY_COLUMNS_SQL: &str = "id,
    habit_id,
    user_id,
    day,
    status,
    notes,
    created_at,
    updated_at";

/// Write model for one check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpsert {
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub day: CanonicalDay,
    pub status: EntryStatus,
    /// Already normalized; `None` clears previous notes.
    pub notes: Option<String>,
    /// Wall-clock time of this write. Becomes `created_at` only on insert.
    pub recorded_at: DateTime<Utc>,
}

/// Repository interface for check-in entries.
pub trait EntryRepository {
    /// Inserts or overwrites the entry for the key and returns the stored row.
    fn upsert_entry(&self, entry: &EntryUpsert) -> RepoResult<HabitEntry>;
    fn get_entry(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        day: CanonicalDay,
    ) -> RepoResult<Option<HabitEntry>>;
    /// Entries with `from <= day <= to`, ascending by day.
    fn list_entries(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        from: CanonicalDay,
        to: CanonicalDay,
    ) -> RepoResult<Vec<HabitEntry>>;
    /// Number of days in `[from, to]` whose entry has `status`.
    fn count_entries_with_status(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        status: EntryStatus,
        from: CanonicalDay,
        to: CanonicalDay,
    ) -> RepoResult<u32>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn upsert_entry(&self, entry: &EntryUpsert) -> RepoResult<HabitEntry> {
        let recorded_at = to_millis(entry.recorded_at);
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO habit_entries (
                id,
                habit_id,
                user_id,
                day,
                status,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (user_id, habit_id, day) DO UPDATE SET
                status = excluded.status,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            RETURNING {ENTRY_COLUMNS_SQL};"
        ))?;

        stmt.query_row(
            params![
                Uuid::new_v4().to_string(),
                entry.habit_id.to_string(),
                entry.user_id.to_string(),
                day::to_key(entry.day),
                entry.status.as_str(),
                entry.notes.as_deref(),
                recorded_at,
            ],
            |row| Ok(parse_entry_row(row)),
        )?
    }

    fn get_entry(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        day: CanonicalDay,
    ) -> RepoResult<Option<HabitEntry>> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS_SQL}
                     FROM habit_entries
                     WHERE user_id = ?1
                       AND habit_id = ?2
                       AND day = ?3;"
                ),
                params![user_id.to_string(), habit_id.to_string(), day::to_key(day)],
                |row| Ok(parse_entry_row(row)),
            )
            .optional()?;
        found.transpose()
    }

    fn list_entries(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        from: CanonicalDay,
        to: CanonicalDay,
    ) -> RepoResult<Vec<HabitEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS_SQL}
             FROM habit_entries
             WHERE user_id = ?1
               AND habit_id = ?2
               AND day >= ?3
               AND day <= ?4
             ORDER BY day ASC;"
        ))?;

        let mut rows = stmt.query(params![
            user_id.to_string(),
            habit_id.to_string(),
            day::to_key(from),
            day::to_key(to),
        ])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn count_entries_with_status(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        status: EntryStatus,
        from: CanonicalDay,
        to: CanonicalDay,
    ) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM habit_entries
             WHERE user_id = ?1
               AND habit_id = ?2
               AND status = ?3
               AND day >= ?4
               AND day <= ?5;",
            params![
                user_id.to_string(),
                habit_id.to_string(),
                status.as_str(),
                day::to_key(from),
                day::to_key(to),
            ],
            |row| row.get(0),
        )?;
        parse_count(count, "COUNT(habit_entries)")
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<HabitEntry> {
    let id_text: String = row.get("id")?;
    let habit_text: String = row.get("habit_id")?;
    let user_text: String = row.get("user_id")?;
    let day_text: String = row.get("day")?;
    let status_text: String = row.get("status")?;
    let status = status_text
        .parse::<EntryStatus>()
        .map_err(|err| RepoError::InvalidData(format!("{err} in habit_entries.status")))?;

    Ok(HabitEntry {
        id: parse_uuid(&id_text, "habit_entries.id")?,
        habit_id: parse_uuid(&habit_text, "habit_entries.habit_id")?,
        user_id: parse_uuid(&user_text, "habit_entries.user_id")?,
        date: parse_day(&day_text, "habit_entries.day")?,
        status,
        notes: row.get("notes")?,
        created_at: from_millis(row.get("created_at")?, "habit_entries.created_at")?,
        updated_at: from_millis(row.get("updated_at")?, "habit_entries.updated_at")?,
    })
}
