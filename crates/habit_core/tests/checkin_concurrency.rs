use chrono::NaiveDate;
use habit_core::{
    CheckInConfig, CheckInRequest, CheckInService, CoreError, Database, DatabaseConfig,
    EntryStatus, Habit, HabitKind, HabitService, NewHabit, Recurrence, SqliteHabitRepository,
    TimeOfDay,
};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

const WRITERS: usize = 8;

fn setup(busy_timeout_ms: u64) -> (TempDir, Database, Habit) {
    let dir = tempfile::tempdir().unwrap();
    let database = Database::initialize(&DatabaseConfig {
        path: dir.path().join("habits.sqlite3"),
        busy_timeout_ms,
    })
    .unwrap();

    let conn = database.connect().unwrap();
    let habit = HabitService::new(SqliteHabitRepository::new(&conn))
        .create_habit(NewHabit::new(
            Uuid::new_v4(),
            "Push-ups",
            HabitKind::Build,
            Recurrence::Daily,
            vec![TimeOfDay::Morning],
        ))
        .unwrap();
    (dir, database, habit)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn load(database: &Database, habit: &Habit) -> Habit {
    let conn = database.connect().unwrap();
    HabitService::new(SqliteHabitRepository::new(&conn))
        .get_habit(habit.id, habit.user_id)
        .unwrap()
}

fn entry_count(database: &Database) -> i64 {
    database
        .connect()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM habit_entries;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn parallel_identical_check_ins_count_once() {
    let (_dir, database, habit) = setup(10_000);

    std::thread::scope(|scope| {
        for _ in 0..WRITERS {
            scope.spawn(|| {
                let conn = database.connect().unwrap();
                CheckInService::new(&conn)
                    .record_check_in(&CheckInRequest::for_day(
                        habit.id,
                        habit.user_id,
                        day(),
                        EntryStatus::Completed,
                    ))
                    .unwrap();
            });
        }
    });

    let stored = load(&database, &habit);
    assert_eq!(stored.streak, 1);
    assert_eq!(stored.longest_streak, 1);
    assert_eq!(stored.last_completed_date, Some(day()));
    assert_eq!(entry_count(&database), 1);
}

#[test]
fn parallel_mixed_statuses_leave_one_entry_from_the_set() {
    let (_dir, database, habit) = setup(10_000);
    let statuses = [
        EntryStatus::Completed,
        EntryStatus::Missed,
        EntryStatus::Skipped,
    ];

    std::thread::scope(|scope| {
        for index in 0..WRITERS {
            let status = statuses[index % statuses.len()];
            let database = &database;
            let habit = &habit;
            scope.spawn(move || {
                let conn = database.connect().unwrap();
                CheckInService::new(&conn)
                    .record_check_in(&CheckInRequest::for_day(
                        habit.id,
                        habit.user_id,
                        day(),
                        status,
                    ))
                    .unwrap();
            });
        }
    });

    let conn = database.connect().unwrap();
    let entries = CheckInService::new(&conn)
        .list_entries(habit.id, habit.user_id, day(), day())
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(statuses.contains(&entries[0].status));

    let stored = load(&database, &habit);
    assert!(stored.streak <= 1);
    assert!(stored.longest_streak <= 1);
}

#[test]
fn held_write_lock_surfaces_conflict_after_retries() {
    let (_dir, database, habit) = setup(0);
    let holder = database.connect().unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let contender = database.connect_with_timeout(Duration::ZERO).unwrap();
    let service = CheckInService::with_config(&contender, &CheckInConfig { max_attempts: 2 });
    let request =
        CheckInRequest::for_day(habit.id, habit.user_id, day(), EntryStatus::Completed);

    let err = service.record_check_in(&request).unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)), "got {err:?}");
    assert!(err.is_retryable());

    holder.execute_batch("COMMIT;").unwrap();

    let outcome = service.record_check_in(&request).unwrap();
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.streak.streak, 1);
    assert_eq!(entry_count(&database), 1);
}
