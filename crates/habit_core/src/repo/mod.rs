//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for habits and entries.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must validate habits before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every habit read and write is scoped by `(habit_id, user_id)`.

use crate::db::DbError;
use crate::day::{self, CanonicalDay};
use crate::model::habit::{HabitId, HabitValidationError};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod entry_repo;
pub mod habit_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] HabitValidationError),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("habit not found: {0}")]
    NotFound(HabitId),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_day(value: &str, column: &str) -> RepoResult<CanonicalDay> {
    day::from_key(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid day `{value}` in {column}")))
}

pub(crate) fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_millis(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn parse_count(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count `{value}` in {column}")))
}
