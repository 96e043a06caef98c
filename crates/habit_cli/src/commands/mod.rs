//! Shared setup for CLI subcommands.

use chrono::NaiveDate;
use habit_core::{init_logging_from_config, CoreConfig, Database};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

pub mod entry;
pub mod habit;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Everything a subcommand needs: validated config and a migrated database.
pub struct Context {
    pub config: CoreConfig,
    pub database: Database,
}

impl Context {
    pub fn open(config_path: Option<PathBuf>, db_override: Option<PathBuf>) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) => CoreConfig::load(path)?,
            None => CoreConfig::default(),
        };
        if let Some(path) = db_override {
            config.database.path = path;
        }

        let logging_started = init_logging_from_config(&config.logging)?;
        let database = Database::initialize(&config.database)?;
        if logging_started {
            info!(
                "event=cli_start module=cli status=ok db_path={}",
                database.path().display()
            );
        }

        Ok(Self { config, database })
    }
}

pub fn parse_day(value: &str) -> Result<NaiveDate, String> {
    habit_core::day::from_key(value.trim())
        .ok_or_else(|| format!("expected a YYYY-MM-DD day, got `{value}`"))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
