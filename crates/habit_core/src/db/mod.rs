//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for habit core.
//! - Apply schema migrations in deterministic order.
//! - Own the process-wide database handle that hands out per-request
//!   connections.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Every connection carries a busy timeout, so no store call blocks forever.

use crate::config::DatabaseConfig;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Process-wide handle to the habit database file.
///
/// Created once at startup (which runs migrations) and dropped at shutdown.
/// Request handlers call [`Database::connect`] to get their own connection;
/// SQLite file locking provides the cross-connection atomicity that the
/// check-in path relies on.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Opens the configured database once and applies pending migrations.
    pub fn initialize(config: &DatabaseConfig) -> DbResult<Self> {
        let busy_timeout = config.busy_timeout();
        let conn = open_db_with_timeout(&config.path, busy_timeout)?;
        drop(conn);
        Ok(Self {
            path: config.path.clone(),
            busy_timeout,
        })
    }

    /// Opens a fresh connection with the configured busy timeout.
    pub fn connect(&self) -> DbResult<Connection> {
        open_db_with_timeout(&self.path, self.busy_timeout)
    }

    /// Opens a fresh connection with a caller-supplied busy timeout.
    pub fn connect_with_timeout(&self, busy_timeout: Duration) -> DbResult<Connection> {
        open_db_with_timeout(&self.path, busy_timeout)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
