//! TOML-based core configuration.
//!
//! # Responsibility
//! - Describe database, logging and check-in settings in one typed struct.
//! - Supply defaults for every field so an empty file is a valid config.
//!
//! # Invariants
//! - `checkin.max_attempts >= 2`: a conflicting check-in is retried at least
//!   once before the conflict is surfaced.
//! - `logging.level` is one of `trace|debug|info|warn|error`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const MIN_CHECKIN_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Database location and lock-wait settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Upper bound for waiting on a competing writer, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Rolling file log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level_string")]
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level_string(),
            dir: None,
        }
    }
}

/// Check-in orchestration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInConfig {
    /// Total attempts for one check-in when the store reports a write conflict.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Core configuration.
///
/// Every section is optional in TOML:
///
/// ```toml
/// [database]
/// path = "/var/lib/habits/habits.sqlite3"
/// busy_timeout_ms = 5000
///
/// [logging]
/// level = "info"
/// dir = "/var/log/habits"
///
/// [checkin]
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub checkin: CheckInConfig,
}

impl CoreConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkin.max_attempts < MIN_CHECKIN_ATTEMPTS {
            return Err(ConfigError::Invalid {
                field: "checkin.max_attempts",
                message: format!(
                    "must be at least {MIN_CHECKIN_ATTEMPTS}, got {}",
                    self.checkin.max_attempts
                ),
            });
        }

        if let Err(message) = crate::logging::normalize_level(&self.logging.level) {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                message,
            });
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.path",
                message: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("habits.sqlite3")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level_string() -> String {
    crate::logging::default_log_level().to_string()
}

fn default_max_attempts() -> u32 {
    3
}
