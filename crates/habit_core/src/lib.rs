//! Core domain logic for habit tracking.
//! This crate is the single source of truth for check-in and streak invariants.

pub mod config;
pub mod day;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod streak;

pub use config::{CheckInConfig, ConfigError, CoreConfig, DatabaseConfig, LoggingConfig};
pub use day::CanonicalDay;
pub use db::{Database, DbError};
pub use error::{parse_id, CoreError, CoreResult, ValidationError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entry::{EntryId, EntryStatus, HabitEntry};
pub use model::habit::{
    Habit, HabitId, HabitKind, HabitPatch, HabitValidationError, NewHabit, Recurrence,
    StreakState, TimeOfDay, UserId, WeekStart,
};
pub use repo::entry_repo::{EntryRepository, EntryUpsert, SqliteEntryRepository};
pub use repo::habit_repo::{HabitRepository, SqliteHabitRepository};
pub use repo::{RepoError, RepoResult};
pub use service::checkin_service::{
    CheckInOutcome, CheckInRequest, CheckInResponse, CheckInService,
};
pub use service::habit_service::HabitService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
