//! Per-day check-in entries.
//!
//! # Invariants
//! - At most one entry exists per `(user_id, habit_id, date)`.
//! - `date` is a canonical UTC day; `created_at` is the wall-clock time the
//!   row was first written and survives later overwrites.

use super::habit::{HabitId, UserId};
use super::{trim_optional, UnknownVariant};
use crate::day::CanonicalDay;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type EntryId = Uuid;

/// Outcome recorded for one habit on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Completed,
    Missed,
    Skipped,
    Avoided,
    Lapsed,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 5] = [
        Self::Completed,
        Self::Missed,
        Self::Skipped,
        Self::Avoided,
        Self::Lapsed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Skipped => "skipped",
            Self::Avoided => "avoided",
            Self::Lapsed => "lapsed",
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("entry status", value))
    }
}

/// Persisted check-in entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub id: EntryId,
    pub habit_id: HabitId,
    pub user_id: UserId,
    pub date: CanonicalDay,
    pub status: EntryStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trims notes; blank notes are stored as absent.
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    trim_optional(notes)
}
