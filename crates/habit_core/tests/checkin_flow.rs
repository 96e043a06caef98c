use chrono::{NaiveDate, TimeZone, Utc};
use habit_core::db::open_db_in_memory;
use habit_core::{
    CheckInRequest, CheckInResponse, CheckInService, CoreError, EntryStatus, Habit, HabitKind,
    HabitService, NewHabit, Recurrence, SqliteHabitRepository, TimeOfDay, ValidationError,
    WeekStart,
};
use rusqlite::Connection;
use std::collections::BTreeSet;
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create(conn: &Connection, user: Uuid, kind: HabitKind, recurrence: Recurrence) -> Habit {
    HabitService::new(SqliteHabitRepository::new(conn))
        .create_habit(NewHabit::new(
            user,
            "habit",
            kind,
            recurrence,
            vec![TimeOfDay::Morning],
        ))
        .unwrap()
}

fn load(conn: &Connection, habit: &Habit) -> Habit {
    HabitService::new(SqliteHabitRepository::new(conn))
        .get_habit(habit.id, habit.user_id)
        .unwrap()
}

fn check_in(conn: &Connection, habit: &Habit, on: NaiveDate, status: EntryStatus) {
    CheckInService::new(conn)
        .record_check_in(&CheckInRequest::for_day(habit.id, habit.user_id, on, status))
        .unwrap();
}

fn entry_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM habit_entries;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn daily_streak_grows_breaks_on_gap_and_keeps_longest() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 1);

    check_in(&conn, &habit, day(2024, 1, 2), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (2, 2));

    check_in(&conn, &habit, day(2024, 1, 4), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!(stored.streak, 1);
    assert_eq!(stored.longest_streak, 2);
    assert_eq!(stored.last_completed_date, Some(day(2024, 1, 4)));
}

#[test]
fn repeated_completion_for_same_day_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);
    let request =
        CheckInRequest::for_day(habit.id, habit.user_id, day(2024, 3, 1), EntryStatus::Completed);

    let first = service.record_check_in(&request).unwrap();
    let second = service.record_check_in(&request).unwrap();

    assert_eq!(first.streak, second.streak);
    assert_eq!(second.previous, second.streak);
    assert_eq!(first.entry.id, second.entry.id);
    assert_eq!(load(&conn, &habit).streak, 1);
    assert_eq!(entry_count(&conn), 1);
}

#[test]
fn missed_resets_streak_but_keeps_longest_and_last_day() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 1, 2), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 1, 3), EntryStatus::Missed);

    let stored = load(&conn, &habit);
    assert_eq!(stored.streak, 0);
    assert_eq!(stored.longest_streak, 2);
    assert_eq!(stored.last_completed_date, Some(day(2024, 1, 2)));
}

#[test]
fn skipped_leaves_streak_alone() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Completed);
    let before = load(&conn, &habit);
    check_in(&conn, &habit, day(2024, 1, 2), EntryStatus::Skipped);
    let after = load(&conn, &habit);

    assert_eq!(after.streak_state(), before.streak_state());
    assert_eq!(entry_count(&conn), 2);
}

#[test]
fn overwriting_a_day_keeps_entry_identity_and_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);
    let on = day(2024, 2, 10);

    let first = service
        .record_check_in(
            &CheckInRequest::for_day(habit.id, habit.user_id, on, EntryStatus::Missed)
                .with_notes("tired"),
        )
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = service
        .record_check_in(&CheckInRequest::for_day(
            habit.id,
            habit.user_id,
            on,
            EntryStatus::Completed,
        ))
        .unwrap();

    assert_eq!(second.entry.id, first.entry.id);
    assert_eq!(second.entry.created_at, first.entry.created_at);
    assert!(second.entry.updated_at >= first.entry.updated_at);
    assert_eq!(second.entry.status, EntryStatus::Completed);
    assert_eq!(second.entry.notes, None);

    let stored = service
        .get_entry(habit.id, habit.user_id, on)
        .unwrap()
        .unwrap();
    assert_eq!(stored, second.entry);
    assert_eq!(entry_count(&conn), 1);
}

#[test]
fn timestamps_on_the_same_utc_day_share_one_entry() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    let morning = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 1).unwrap();
    let night = Utc.with_ymd_and_hms(2024, 4, 2, 23, 59, 59).unwrap();
    let first = service
        .record_check_in(&CheckInRequest::new(
            habit.id,
            habit.user_id,
            morning,
            EntryStatus::Completed,
        ))
        .unwrap();
    let second = service
        .record_check_in(&CheckInRequest::new(
            habit.id,
            habit.user_id,
            night,
            EntryStatus::Completed,
        ))
        .unwrap();

    assert_eq!(first.entry.date, day(2024, 4, 2));
    assert_eq!(second.entry.id, first.entry.id);
    assert_eq!(entry_count(&conn), 1);
    assert_eq!(load(&conn, &habit).streak, 1);
}

#[test]
fn quit_habit_rejects_build_statuses_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Quit, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    let err = service
        .record_check_in(&CheckInRequest::for_day(
            habit.id,
            habit.user_id,
            day(2024, 1, 1),
            EntryStatus::Completed,
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::StatusNotAllowed {
            kind: HabitKind::Quit,
            status: EntryStatus::Completed,
        })
    ));
    assert!(!err.is_retryable());
    assert_eq!(entry_count(&conn), 0);

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Avoided);
    check_in(&conn, &habit, day(2024, 1, 2), EntryStatus::Avoided);
    assert_eq!(load(&conn, &habit).streak, 2);
    check_in(&conn, &habit, day(2024, 1, 3), EntryStatus::Lapsed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (0, 2));
}

#[test]
fn unknown_or_foreign_habit_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    let foreign = CheckInRequest::for_day(
        habit.id,
        Uuid::new_v4(),
        day(2024, 1, 1),
        EntryStatus::Completed,
    );
    assert!(matches!(
        service.record_check_in(&foreign),
        Err(CoreError::NotFound(id)) if id == habit.id
    ));

    let missing = CheckInRequest::for_day(
        Uuid::new_v4(),
        habit.user_id,
        day(2024, 1, 1),
        EntryStatus::Completed,
    );
    assert!(matches!(
        service.record_check_in(&missing),
        Err(CoreError::NotFound(_))
    ));
    assert_eq!(entry_count(&conn), 0);
}

#[test]
fn list_entries_is_ordered_inclusive_and_owner_scoped() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    for on in [day(2024, 1, 5), day(2024, 1, 1), day(2024, 1, 3), day(2024, 1, 9)] {
        check_in(&conn, &habit, on, EntryStatus::Completed);
    }

    let days: Vec<NaiveDate> = service
        .list_entries(habit.id, habit.user_id, day(2024, 1, 1), day(2024, 1, 5))
        .unwrap()
        .into_iter()
        .map(|entry| entry.date)
        .collect();
    assert_eq!(days, vec![day(2024, 1, 1), day(2024, 1, 3), day(2024, 1, 5)]);

    let inverted = service
        .list_entries(habit.id, habit.user_id, day(2024, 1, 9), day(2024, 1, 1))
        .unwrap();
    assert!(inverted.is_empty());

    assert!(matches!(
        service.list_entries(habit.id, Uuid::new_v4(), day(2024, 1, 1), day(2024, 1, 9)),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn blank_notes_are_stored_as_absent() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    let blank = service
        .record_check_in(
            &CheckInRequest::for_day(habit.id, habit.user_id, day(2024, 1, 1), EntryStatus::Completed)
                .with_notes("   "),
        )
        .unwrap();
    assert_eq!(blank.entry.notes, None);

    let trimmed = service
        .record_check_in(
            &CheckInRequest::for_day(habit.id, habit.user_id, day(2024, 1, 2), EntryStatus::Completed)
                .with_notes("  felt good "),
        )
        .unwrap();
    assert_eq!(trimmed.entry.notes.as_deref(), Some("felt good"));
}

#[test]
fn weekly_habit_ignores_unscheduled_days() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::Weekly {
            days_of_week: BTreeSet::from([1, 3, 5]),
        },
    );

    // 2024-05-06 is a Monday.
    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Missed);
    assert_eq!(load(&conn, &habit).streak, 1);

    check_in(&conn, &habit, day(2024, 5, 8), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 2);

    check_in(&conn, &habit, day(2024, 5, 10), EntryStatus::Missed);
    assert_eq!(load(&conn, &habit).streak, 0);

    check_in(&conn, &habit, day(2024, 5, 13), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (1, 2));
}

#[test]
fn every_n_days_counts_only_due_successes() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::EveryNDays { interval: 3 },
    );

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 1, 2), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 1);

    check_in(&conn, &habit, day(2024, 1, 4), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 2);

    check_in(&conn, &habit, day(2024, 1, 10), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (1, 2));
}

#[test]
fn times_per_week_advances_once_per_week_at_quota() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::TimesPerWeek {
            times: 2,
            week_starts_on: WeekStart::Monday,
        },
    );

    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 0);
    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 1);
    check_in(&conn, &habit, day(2024, 5, 8), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 1);

    check_in(&conn, &habit, day(2024, 5, 13), EntryStatus::Completed);
    assert_eq!(load(&conn, &habit).streak, 1);
    check_in(&conn, &habit, day(2024, 5, 14), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (2, 2));
    assert_eq!(stored.last_completed_date, Some(day(2024, 5, 14)));
}

#[test]
fn archived_habit_still_accepts_check_ins() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    HabitService::new(SqliteHabitRepository::new(&conn))
        .archive_habit(habit.id, habit.user_id)
        .unwrap();

    check_in(&conn, &habit, day(2024, 1, 1), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert!(stored.archived);
    assert_eq!(stored.streak, 1);
}

#[test]
fn response_envelope_reports_status_or_error() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(&conn, Uuid::new_v4(), HabitKind::Build, Recurrence::Daily);
    let service = CheckInService::new(&conn);

    let ok = service.record_check_in(&CheckInRequest::for_day(
        habit.id,
        habit.user_id,
        day(2024, 1, 1),
        EntryStatus::Completed,
    ));
    let response = CheckInResponse::from_result(EntryStatus::Completed, &ok);
    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("Habit marked as completed."));

    let failed = service.record_check_in(&CheckInRequest::for_day(
        habit.id,
        habit.user_id,
        day(2024, 1, 1),
        EntryStatus::Lapsed,
    ));
    let response = CheckInResponse::from_result(EntryStatus::Lapsed, &failed);
    assert!(!response.success);
    assert!(response.message.unwrap().contains("not valid for a build habit"));
}

fn streaks(conn: &Connection, habit: &Habit) -> (u32, u32) {
    let stored = load(conn, habit);
    (stored.streak, stored.longest_streak)
}

#[test]
fn missed_day_in_a_week_that_met_its_quota_keeps_the_run() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::TimesPerWeek {
            times: 1,
            week_starts_on: WeekStart::Monday,
        },
    );

    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Missed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 13), EntryStatus::Completed);
    assert_eq!(streaks(&conn, &habit), (2, 2));
}

#[test]
fn week_below_quota_restarts_the_weekly_run() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::TimesPerWeek {
            times: 2,
            week_starts_on: WeekStart::Monday,
        },
    );

    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Completed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    // Week of 05-13: one success and one miss, below the quota of two.
    check_in(&conn, &habit, day(2024, 5, 13), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 14), EntryStatus::Missed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 20), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 21), EntryStatus::Completed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (1, 1));
    assert_eq!(stored.last_completed_date, Some(day(2024, 5, 21)));
}

#[test]
fn every_n_days_miss_before_due_day_is_neutral() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Build,
        Recurrence::EveryNDays { interval: 3 },
    );

    check_in(&conn, &habit, day(2024, 5, 1), EntryStatus::Completed);
    check_in(&conn, &habit, day(2024, 5, 2), EntryStatus::Missed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 4), EntryStatus::Completed);
    assert_eq!(streaks(&conn, &habit), (2, 2));

    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Missed);
    let stored = load(&conn, &habit);
    assert_eq!((stored.streak, stored.longest_streak), (0, 2));
    assert_eq!(stored.last_completed_date, Some(day(2024, 5, 4)));
}

#[test]
fn quit_habit_on_weekly_schedule_ignores_unscheduled_lapses() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Quit,
        Recurrence::Weekly {
            days_of_week: BTreeSet::from([1, 3, 5]),
        },
    );

    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Avoided);
    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 8), EntryStatus::Avoided);
    assert_eq!(streaks(&conn, &habit), (2, 2));

    check_in(&conn, &habit, day(2024, 5, 10), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (0, 2));
}

#[test]
fn quit_habit_on_interval_schedule_counts_due_days() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Quit,
        Recurrence::EveryNDays { interval: 2 },
    );

    check_in(&conn, &habit, day(2024, 5, 1), EntryStatus::Avoided);
    check_in(&conn, &habit, day(2024, 5, 2), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 3), EntryStatus::Avoided);
    assert_eq!(streaks(&conn, &habit), (2, 2));

    check_in(&conn, &habit, day(2024, 5, 5), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (0, 2));
}

#[test]
fn quit_habit_weekly_quota_counts_avoided_days() {
    let conn = open_db_in_memory().unwrap();
    let habit = create(
        &conn,
        Uuid::new_v4(),
        HabitKind::Quit,
        Recurrence::TimesPerWeek {
            times: 2,
            week_starts_on: WeekStart::Sunday,
        },
    );

    // 2024-05-05 is a Sunday.
    check_in(&conn, &habit, day(2024, 5, 5), EntryStatus::Avoided);
    check_in(&conn, &habit, day(2024, 5, 6), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (0, 0));

    check_in(&conn, &habit, day(2024, 5, 7), EntryStatus::Avoided);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 8), EntryStatus::Lapsed);
    assert_eq!(streaks(&conn, &habit), (1, 1));

    check_in(&conn, &habit, day(2024, 5, 12), EntryStatus::Avoided);
    check_in(&conn, &habit, day(2024, 5, 13), EntryStatus::Avoided);
    assert_eq!(streaks(&conn, &habit), (2, 2));
}
