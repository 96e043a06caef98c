//! Habit configuration use-cases.
//!
//! # Responsibility
//! - Create, read, list, patch and archive habits for one owner.
//! - Map repository outcomes onto the public error taxonomy.
//!
//! # Invariants
//! - Validation runs before any write.
//! - Streak counters are never modified here.

use crate::error::{CoreError, CoreResult};
use crate::model::habit::{Habit, HabitId, HabitPatch, NewHabit, UserId};
use crate::model::now_millis;
use crate::repo::habit_repo::HabitRepository;
use log::{info, warn};

/// Use-case service wrapper for habit configuration.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores a new habit with zeroed streak counters.
    pub fn create_habit(&self, input: NewHabit) -> CoreResult<Habit> {
        let habit = match input.into_habit(now_millis()) {
            Ok(habit) => habit,
            Err(err) => {
                warn!("event=habit_create module=service status=rejected error_code=validation");
                return Err(err.into());
            }
        };
        self.repo.create_habit(&habit)?;
        info!(
            "event=habit_create module=service status=ok habit_id={} kind={} recurrence={}",
            habit.id,
            habit.kind,
            habit.recurrence.type_str()
        );
        Ok(habit)
    }

    /// Gets one habit owned by `user_id`, archived or not.
    pub fn get_habit(&self, habit_id: HabitId, user_id: UserId) -> CoreResult<Habit> {
        self.repo
            .get_habit(habit_id, user_id)?
            .ok_or(CoreError::NotFound(habit_id))
    }

    /// Lists non-archived habits, newest first.
    pub fn list_active_habits(&self, user_id: UserId) -> CoreResult<Vec<Habit>> {
        Ok(self.repo.list_active_habits(user_id)?)
    }

    /// Applies a configuration patch and returns the updated habit.
    ///
    /// An empty patch returns the stored habit unchanged.
    pub fn update_habit(
        &self,
        habit_id: HabitId,
        user_id: UserId,
        patch: &HabitPatch,
    ) -> CoreResult<Habit> {
        let mut habit = self.get_habit(habit_id, user_id)?;
        if patch.is_empty() {
            return Ok(habit);
        }

        patch.apply_to(&mut habit)?;
        habit.updated_at = now_millis();
        self.repo.update_habit_config(&habit)?;
        info!(
            "event=habit_update module=service status=ok habit_id={} recurrence={}",
            habit.id,
            habit.recurrence.type_str()
        );
        Ok(habit)
    }

    /// Soft-deletes a habit. Its entries stay in place.
    pub fn archive_habit(&self, habit_id: HabitId, user_id: UserId) -> CoreResult<()> {
        self.repo.archive_habit(habit_id, user_id)?;
        info!("event=habit_archive module=service status=ok habit_id={habit_id}");
        Ok(())
    }
}
