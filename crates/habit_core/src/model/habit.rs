//! Habit configuration, recurrence rules and denormalized streak counters.
//!
//! # Invariants
//! - `name` is trimmed and non-empty.
//! - Recurrence: `interval >= 1`, `1 <= times <= 7`, `days_of_week` non-empty
//!   with every value in `0..=6` (Sunday = 0).
//! - `longest_streak >= streak`.
//! - Streak fields change only through the check-in path; [`HabitPatch`]
//!   cannot touch them.

use super::entry::EntryStatus;
use super::{trim_optional, UnknownVariant};
use crate::day::CanonicalDay;
use chrono::{DateTime, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub type HabitId = Uuid;
/// Opaque user identity supplied by the identity provider.
pub type UserId = Uuid;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("valid hex color regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitValidationError {
    #[error("habit id must not be nil")]
    NilId,
    #[error("habit name cannot be empty")]
    EmptyName,
    #[error("color `{0}` is not a #RGB or #RRGGBB hex value")]
    InvalidColor(String),
    #[error("at least one time of day is required")]
    EmptyTimeOfDay,
    #[error("weekly recurrence needs at least one weekday")]
    EmptyDaysOfWeek,
    #[error("weekday {0} is outside 0..=6")]
    InvalidWeekday(u8),
    #[error("every_n_days interval must be >= 1")]
    ZeroInterval,
    #[error("times_per_week target must be >= 1")]
    ZeroTimes,
    #[error("times_per_week target {0} cannot be met in a 7-day week")]
    TimesExceedWeek(u32),
    #[error("cannot change habit type while a streak of {0} is running")]
    KindChangeWithActiveStreak(u32),
    #[error("longest streak {longest} is below current streak {streak}")]
    LongestBelowStreak { streak: u32, longest: u32 },
}

/// Whether completing or abstaining advances the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    /// `completed` advances the streak, `missed` resets it.
    Build,
    /// `avoided` advances the streak, `lapsed` resets it.
    Quit,
}

impl HabitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Quit => "quit",
        }
    }

    /// Status that extends the streak for this kind.
    pub fn success_status(self) -> EntryStatus {
        match self {
            Self::Build => EntryStatus::Completed,
            Self::Quit => EntryStatus::Avoided,
        }
    }

    /// Status that breaks the streak for this kind.
    pub fn failure_status(self) -> EntryStatus {
        match self {
            Self::Build => EntryStatus::Missed,
            Self::Quit => EntryStatus::Lapsed,
        }
    }

    /// Statuses a check-in may record against this kind.
    pub fn accepts(self, status: EntryStatus) -> bool {
        status == EntryStatus::Skipped
            || status == self.success_status()
            || status == self.failure_status()
    }
}

impl Display for HabitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HabitKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "build" => Ok(Self::Build),
            "quit" => Ok(Self::Quit),
            other => Err(UnknownVariant::new("habit type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            other => Err(UnknownVariant::new("time of day", other)),
        }
    }
}

/// First day of a `times_per_week` week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl WeekStart {
    /// Stored form: `0` for Sunday, `1` for Monday.
    pub fn as_index(self) -> u8 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
        }
    }

    pub fn from_index(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sunday),
            1 => Some(Self::Monday),
            _ => None,
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Sunday => Weekday::Sun,
            Self::Monday => Weekday::Mon,
        }
    }
}

impl FromStr for WeekStart {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sunday" => Ok(Self::Sunday),
            "monday" => Ok(Self::Monday),
            other => Err(UnknownVariant::new("week start", other)),
        }
    }
}

/// Schedule a habit is expected to follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    /// Scheduled weekdays, Sunday = 0 .. Saturday = 6.
    Weekly { days_of_week: BTreeSet<u8> },
    EveryNDays { interval: u32 },
    /// At least `times` successful days per week.
    TimesPerWeek { times: u32, week_starts_on: WeekStart },
}

impl Recurrence {
    /// Discriminant as stored in `habits.recurrence_type`.
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly { .. } => "weekly",
            Self::EveryNDays { .. } => "every_n_days",
            Self::TimesPerWeek { .. } => "times_per_week",
        }
    }

    pub fn validate(&self) -> Result<(), HabitValidationError> {
        match self {
            Self::Daily => Ok(()),
            Self::Weekly { days_of_week } => {
                if days_of_week.is_empty() {
                    return Err(HabitValidationError::EmptyDaysOfWeek);
                }
                match days_of_week.iter().find(|day| **day > 6) {
                    Some(day) => Err(HabitValidationError::InvalidWeekday(*day)),
                    None => Ok(()),
                }
            }
            Self::EveryNDays { interval } => {
                if *interval == 0 {
                    Err(HabitValidationError::ZeroInterval)
                } else {
                    Ok(())
                }
            }
            Self::TimesPerWeek { times, .. } => match *times {
                0 => Err(HabitValidationError::ZeroTimes),
                t if t > 7 => Err(HabitValidationError::TimesExceedWeek(t)),
                _ => Ok(()),
            },
        }
    }
}

/// Denormalized streak counters stored on the habit row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub streak: u32,
    pub longest_streak: u32,
    /// Most recent day on which the streak advanced.
    pub last_completed_date: Option<CanonicalDay>,
}

/// Persisted habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: HabitKind,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub time_of_day: Vec<TimeOfDay>,
    pub recurrence: Recurrence,
    pub streak: u32,
    pub longest_streak: u32,
    pub last_completed_date: Option<CanonicalDay>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    pub fn streak_state(&self) -> StreakState {
        StreakState {
            streak: self.streak,
            longest_streak: self.longest_streak,
            last_completed_date: self.last_completed_date,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.archived
    }

    /// Normalizes free-text fields in place.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.description = trim_optional(self.description.take());
        self.color = trim_optional(self.color.take());
        self.icon = trim_optional(self.icon.take());
        dedup_in_order(&mut self.time_of_day);
    }

    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.is_nil() {
            return Err(HabitValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        if let Some(color) = self.color.as_deref() {
            if !HEX_COLOR_RE.is_match(color) {
                return Err(HabitValidationError::InvalidColor(color.to_string()));
            }
        }
        if self.time_of_day.is_empty() {
            return Err(HabitValidationError::EmptyTimeOfDay);
        }
        self.recurrence.validate()?;
        if self.longest_streak < self.streak {
            return Err(HabitValidationError::LongestBelowStreak {
                streak: self.streak,
                longest: self.longest_streak,
            });
        }
        Ok(())
    }
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabit {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: HabitKind,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub time_of_day: Vec<TimeOfDay>,
    pub recurrence: Recurrence,
}

impl NewHabit {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        kind: HabitKind,
        recurrence: Recurrence,
        time_of_day: Vec<TimeOfDay>,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            description: None,
            kind,
            color: None,
            icon: None,
            time_of_day,
            recurrence,
        }
    }

    /// Builds a normalized, validated habit with zeroed streak counters.
    pub fn into_habit(self, now: DateTime<Utc>) -> Result<Habit, HabitValidationError> {
        let mut habit = Habit {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            color: self.color,
            icon: self.icon,
            time_of_day: self.time_of_day,
            recurrence: self.recurrence,
            streak: 0,
            longest_streak: 0,
            last_completed_date: None,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        habit.normalize();
        habit.validate()?;
        Ok(habit)
    }
}

/// Partial update of habit configuration fields.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub kind: Option<HabitKind>,
    #[serde(default)]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub icon: Option<Option<String>>,
    #[serde(default)]
    pub time_of_day: Option<Vec<TimeOfDay>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch, then normalizes and validates the result.
    ///
    /// Switching between build and quit is refused while a streak is running,
    /// since the counters were earned under the other kind's statuses.
    pub fn apply_to(&self, habit: &mut Habit) -> Result<(), HabitValidationError> {
        if self.kind.is_some_and(|kind| kind != habit.kind) && habit.streak > 0 {
            return Err(HabitValidationError::KindChangeWithActiveStreak(habit.streak));
        }
        if let Some(name) = &self.name {
            habit.name = name.clone();
        }
        if let Some(description) = &self.description {
            habit.description = description.clone();
        }
        if let Some(kind) = self.kind {
            habit.kind = kind;
        }
        if let Some(color) = &self.color {
            habit.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            habit.icon = icon.clone();
        }
        if let Some(time_of_day) = &self.time_of_day {
            habit.time_of_day = time_of_day.clone();
        }
        if let Some(recurrence) = &self.recurrence {
            habit.recurrence = recurrence.clone();
        }
        habit.normalize();
        habit.validate()
    }
}

fn dedup_in_order(values: &mut Vec<TimeOfDay>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|value| {
        if seen.contains(value) {
            false
        } else {
            seen.push(*value);
            true
        }
    });
}
