//! Habit tracking domain model.
//!
//! # Responsibility
//! - Define habits, their recurrence rules and per-day check-in entries.
//! - Own field-level validation shared by repositories and services.
//!
//! # Invariants
//! - Every habit and entry is identified by a stable UUID.
//! - Archiving is a soft delete; habits and entries are never hard-deleted.

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

pub mod entry;
pub mod habit;

/// Text value that does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Trims optional free text and collapses blank values to `None`.
pub(crate) fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Current time at the millisecond precision timestamps are stored with.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
