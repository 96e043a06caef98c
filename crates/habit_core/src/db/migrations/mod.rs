//! Habit schema migrations.
//!
//! Each step is an embedded SQL script tagged with the `PRAGMA user_version`
//! it brings the file to. Steps run inside one `IMMEDIATE` transaction, so
//! two processes opening a fresh file at the same time cannot both apply them.
//!
//! `habit_entries` must keep `UNIQUE (user_id, habit_id, day)`: the check-in
//! upsert targets that key.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "habits",
        sql: include_str!("0001_habits.sql"),
    },
    SchemaStep {
        version: 2,
        name: "habit_entries",
        sql: include_str!("0002_habit_entries.sql"),
    },
];

/// Schema version this build writes and understands.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the connected file up to [`latest_version`].
///
/// Returns how many steps were applied by this call; `0` when another
/// connection got there first or the file was already current.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let latest = latest_version();
    let on_disk = schema_version(conn)?;
    check_supported(on_disk, latest)?;
    if on_disk == latest {
        return Ok(0);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = schema_version(&tx)?;
    check_supported(from, latest)?;

    let mut applied = 0;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=applied version={} name={}",
            step.version, step.name
        );
        applied += 1;
    }
    tx.commit()?;

    Ok(applied)
}

fn check_supported(db_version: u32, latest_supported: u32) -> DbResult<()> {
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
