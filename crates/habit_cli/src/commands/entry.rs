//! Check-in commands.

use super::{parse_day, print_json, CliResult, Context};
use chrono::NaiveDate;
use clap::Subcommand;
use habit_core::day;
use habit_core::{
    parse_id, CheckInOutcome, CheckInRequest, CheckInResponse, CheckInService, CoreResult,
    EntryStatus,
};
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Record a check-in and update the streak
    Record {
        #[arg(long)]
        user: String,
        habit_id: String,
        /// completed, missed, skipped, avoided or lapsed
        #[arg(long)]
        status: EntryStatus,
        /// Day as YYYY-MM-DD, defaults to today (UTC)
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the entry for one day
    Get {
        #[arg(long)]
        user: String,
        habit_id: String,
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// List entries in an inclusive day range
    List {
        #[arg(long)]
        user: String,
        habit_id: String,
        #[arg(long, value_parser = parse_day)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_day)]
        to: NaiveDate,
    },
}

pub fn run(ctx: &Context, action: EntryAction) -> CliResult {
    let conn = ctx.database.connect()?;
    let service = CheckInService::with_config(&conn, &ctx.config.checkin);

    match action {
        EntryAction::Record {
            user,
            habit_id,
            status,
            date,
            notes,
        } => {
            let mut request = CheckInRequest::for_day(
                parse_id("habit id", &habit_id)?,
                parse_id("user id", &user)?,
                date.unwrap_or_else(day::today),
                status,
            );
            request.notes = notes;

            let result = service.record_check_in(&request);
            print_json(&record_output(status, &result))?;
            result?;
            Ok(())
        }
        EntryAction::Get {
            user,
            habit_id,
            date,
        } => {
            let entry = service.get_entry(
                parse_id("habit id", &habit_id)?,
                parse_id("user id", &user)?,
                date.unwrap_or_else(day::today),
            )?;
            print_json(&entry)
        }
        EntryAction::List {
            user,
            habit_id,
            from,
            to,
        } => {
            let entries = service.list_entries(
                parse_id("habit id", &habit_id)?,
                parse_id("user id", &user)?,
                from,
                to,
            )?;
            print_json(&entries)
        }
    }
}

/// One JSON document for `entry record`: the envelope and, on success, the outcome.
fn record_output(status: EntryStatus, result: &CoreResult<CheckInOutcome>) -> Value {
    json!({
        "response": CheckInResponse::from_result(status, result),
        "outcome": result.as_ref().ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::record_output;
    use chrono::NaiveDate;
    use habit_core::db::open_db_in_memory;
    use habit_core::{
        parse_id, CheckInRequest, CheckInService, CoreError, EntryStatus, HabitKind,
        HabitService, NewHabit, Recurrence, SqliteHabitRepository, TimeOfDay,
    };

    #[test]
    fn record_output_is_a_single_document() {
        let conn = open_db_in_memory().unwrap();
        let user = parse_id("user id", "00000000-0000-0000-0000-000000000001").unwrap();
        let habit = HabitService::new(SqliteHabitRepository::new(&conn))
            .create_habit(NewHabit::new(
                user,
                "Read",
                HabitKind::Build,
                Recurrence::Daily,
                vec![TimeOfDay::Evening],
            ))
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = CheckInService::new(&conn).record_check_in(&CheckInRequest::for_day(
            habit.id,
            user,
            day,
            EntryStatus::Completed,
        ));

        let text = serde_json::to_string_pretty(&record_output(EntryStatus::Completed, &result))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["response"]["success"], true);
        assert_eq!(value["response"]["message"], "Habit marked as completed.");
        assert_eq!(value["outcome"]["streak"]["streak"], 1);
        assert_eq!(value["outcome"]["entry"]["date"], "2024-03-01");
    }

    #[test]
    fn failed_record_keeps_envelope_and_null_outcome() {
        let missing = parse_id("habit id", "00000000-0000-0000-0000-000000000002").unwrap();
        let value = record_output(EntryStatus::Missed, &Err(CoreError::NotFound(missing)));
        assert_eq!(value["response"]["success"], false);
        assert!(value["outcome"].is_null());
    }
}
