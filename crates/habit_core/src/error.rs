//! Public error taxonomy for core operations.
//!
//! # Invariants
//! - `Validation` and `NotFound` are raised before any mutation.
//! - `Conflict` means the store rejected a write because another writer held
//!   the lock or the unique key; the check-in path retries it.
//! - `Storage` covers every other backend failure and is retryable by the
//!   caller. Core keeps no local state that would need cleanup.

use crate::db::DbError;
use crate::model::entry::EntryStatus;
use crate::model::habit::{HabitId, HabitKind, HabitValidationError};
use crate::repo::RepoError;
use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Habit(#[from] HabitValidationError),
    #[error("status `{status}` is not valid for a {kind} habit")]
    StatusNotAllowed {
        kind: HabitKind,
        status: EntryStatus,
    },
    #[error("malformed {field}: `{value}`")]
    MalformedId { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("habit not found: {0}")]
    NotFound(HabitId),
    #[error("write conflict: {0}")]
    Conflict(#[source] RepoError),
    #[error("storage failure: {0}")]
    Storage(#[source] RepoError),
}

impl CoreError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Storage(_))
    }

    /// Stable code for log lines and response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(ValidationError::Habit(err)),
            other if is_conflict(&other) => Self::Conflict(other),
            other => Self::Storage(other),
        }
    }
}

impl From<HabitValidationError> for CoreError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(ValidationError::Habit(value))
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        RepoError::Db(value).into()
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

/// Parses an identifier supplied by a caller.
pub fn parse_id(field: &'static str, value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::MalformedId {
        field,
        value: value.to_string(),
    })
}

fn is_conflict(err: &RepoError) -> bool {
    let RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))) = err else {
        return false;
    };
    match failure.code {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => true,
        ErrorCode::ConstraintViolation => matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}
