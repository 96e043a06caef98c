//! Habit configuration commands.

use super::{print_json, CliResult, Context};
use clap::{Args, Subcommand};
use habit_core::{
    parse_id, HabitKind, HabitPatch, HabitService, NewHabit, Recurrence, SqliteHabitRepository,
    TimeOfDay, WeekStart,
};
use std::collections::BTreeSet;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Create {
        /// Owner id
        #[arg(long)]
        user: String,
        /// Habit name
        name: String,
        /// build or quit
        #[arg(long = "type", default_value = "build")]
        kind: HabitKind,
        #[arg(long)]
        description: Option<String>,
        /// Hex color, e.g. #33aa55
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        /// Comma-separated: morning, afternoon, evening
        #[arg(long, value_delimiter = ',', default_value = "morning")]
        time_of_day: Vec<TimeOfDay>,
        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },
    /// Show one habit
    Get {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// List active habits, newest first
    List {
        #[arg(long)]
        user: String,
    },
    /// Change habit configuration
    Update {
        #[arg(long)]
        user: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long, value_delimiter = ',')]
        time_of_day: Option<Vec<TimeOfDay>>,
        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },
    /// Archive a habit; its entries are kept
    Archive {
        #[arg(long)]
        user: String,
        id: String,
    },
}

#[derive(Args)]
pub struct RecurrenceArgs {
    /// daily, weekly, every_n_days or times_per_week
    #[arg(long)]
    recurrence: Option<String>,
    /// Weekly days, Sunday = 0 .. Saturday = 6, comma-separated
    #[arg(long, value_delimiter = ',')]
    days: Vec<u8>,
    /// Interval for every_n_days
    #[arg(long)]
    interval: Option<u32>,
    /// Quota for times_per_week
    #[arg(long)]
    times: Option<u32>,
    /// sunday or monday
    #[arg(long, default_value = "monday")]
    week_starts_on: WeekStart,
}

impl RecurrenceArgs {
    fn to_recurrence(&self) -> CliResult<Option<Recurrence>> {
        let Some(kind) = self.recurrence.as_deref() else {
            return Ok(None);
        };
        let recurrence = match kind {
            "daily" => Recurrence::Daily,
            "weekly" => Recurrence::Weekly {
                days_of_week: self.days.iter().copied().collect::<BTreeSet<u8>>(),
            },
            "every_n_days" => Recurrence::EveryNDays {
                interval: self.interval.ok_or("--interval is required for every_n_days")?,
            },
            "times_per_week" => Recurrence::TimesPerWeek {
                times: self.times.ok_or("--times is required for times_per_week")?,
                week_starts_on: self.week_starts_on,
            },
            other => return Err(format!("unknown recurrence `{other}`").into()),
        };
        Ok(Some(recurrence))
    }
}

pub fn run(ctx: &Context, action: HabitAction) -> CliResult {
    let conn = ctx.database.connect()?;
    let service = HabitService::new(SqliteHabitRepository::new(&conn));

    match action {
        HabitAction::Create {
            user,
            name,
            kind,
            description,
            color,
            icon,
            time_of_day,
            recurrence,
        } => {
            let recurrence = recurrence.to_recurrence()?.unwrap_or(Recurrence::Daily);
            let mut input = NewHabit::new(
                parse_id("user id", &user)?,
                name,
                kind,
                recurrence,
                time_of_day,
            );
            input.description = description;
            input.color = color;
            input.icon = icon;
            print_json(&service.create_habit(input)?)
        }
        HabitAction::Get { user, id } => {
            let habit = service.get_habit(parse_id("habit id", &id)?, parse_id("user id", &user)?)?;
            print_json(&habit)
        }
        HabitAction::List { user } => {
            print_json(&service.list_active_habits(parse_id("user id", &user)?)?)
        }
        HabitAction::Update {
            user,
            id,
            name,
            description,
            color,
            icon,
            time_of_day,
            recurrence,
        } => {
            let patch = HabitPatch {
                name,
                description: description.map(Some),
                kind: None,
                color: color.map(Some),
                icon: icon.map(Some),
                time_of_day,
                recurrence: recurrence.to_recurrence()?,
            };
            let habit = service.update_habit(
                parse_id("habit id", &id)?,
                parse_id("user id", &user)?,
                &patch,
            )?;
            print_json(&habit)
        }
        HabitAction::Archive { user, id } => {
            let habit_id = parse_id("habit id", &id)?;
            service.archive_habit(habit_id, parse_id("user id", &user)?)?;
            print_json(&serde_json::json!({ "archived": habit_id }))
        }
    }
}
