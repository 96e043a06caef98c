//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file with the default busy timeout and applies
/// all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// `busy_timeout` bounds how long any statement on this connection waits for
/// a competing writer before failing with `SQLITE_BUSY`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(&mut conn, busy_timeout, "file", started_at)?;
    Ok(conn)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(&mut conn, DEFAULT_BUSY_TIMEOUT, "memory", started_at)?;
    Ok(conn)
}

fn finish_open(
    conn: &mut Connection,
    busy_timeout: Duration,
    mode: &str,
    started_at: Instant,
) -> DbResult<()> {
    match bootstrap_connection(conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}
