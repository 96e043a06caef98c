use chrono::{NaiveDate, TimeZone, Utc};
use habit_core::{
    EntryStatus, HabitEntry, HabitKind, HabitPatch, NewHabit, Recurrence, TimeOfDay, WeekStart,
};
use serde_json::json;
use std::collections::BTreeSet;
use uuid::Uuid;

#[test]
fn habit_serializes_kind_as_type_and_tags_recurrence() {
    let mut input = NewHabit::new(
        Uuid::new_v4(),
        "Yoga",
        HabitKind::Build,
        Recurrence::Weekly {
            days_of_week: BTreeSet::from([3, 1]),
        },
        vec![TimeOfDay::Morning, TimeOfDay::Evening],
    );
    input.color = Some("#112233".to_string());
    let habit = input.into_habit(Utc::now()).unwrap();

    let value = serde_json::to_value(&habit).unwrap();
    assert_eq!(value["type"], json!("build"));
    assert_eq!(
        value["recurrence"],
        json!({"type": "weekly", "days_of_week": [1, 3]})
    );
    assert_eq!(value["time_of_day"], json!(["morning", "evening"]));
    assert_eq!(value["streak"], json!(0));
    assert_eq!(value["last_completed_date"], json!(null));
    assert_eq!(value["archived"], json!(false));
}

#[test]
fn recurrence_variants_parse_from_json() {
    let cases = [
        (json!({"type": "daily"}), Recurrence::Daily),
        (
            json!({"type": "every_n_days", "interval": 2}),
            Recurrence::EveryNDays { interval: 2 },
        ),
        (
            json!({"type": "times_per_week", "times": 3, "week_starts_on": "sunday"}),
            Recurrence::TimesPerWeek {
                times: 3,
                week_starts_on: WeekStart::Sunday,
            },
        ),
    ];
    for (value, expected) in cases {
        let parsed: Recurrence = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, expected);
    }

    let unknown = serde_json::from_value::<Recurrence>(json!({"type": "monthly"}));
    assert!(unknown.is_err());
}

#[test]
fn new_habit_accepts_minimal_payload() {
    let user = Uuid::new_v4();
    let input: NewHabit = serde_json::from_value(json!({
        "user_id": user,
        "name": "No sugar",
        "type": "quit",
        "time_of_day": ["afternoon"],
        "recurrence": {"type": "daily"}
    }))
    .unwrap();

    assert_eq!(input.user_id, user);
    assert_eq!(input.kind, HabitKind::Quit);
    assert_eq!(input.description, None);
    assert_eq!(input.color, None);
}

#[test]
fn patch_distinguishes_missing_from_null() {
    let patch: HabitPatch = serde_json::from_value(json!({"name": "Walk"})).unwrap();
    assert_eq!(patch.name.as_deref(), Some("Walk"));
    assert_eq!(patch.color, None);

    let empty: HabitPatch = serde_json::from_value(json!({})).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn entry_serializes_day_key_and_status() {
    let entry = HabitEntry {
        id: Uuid::new_v4(),
        habit_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        status: EntryStatus::Avoided,
        notes: Some("held firm".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(value["date"], json!("2024-02-29"));
    assert_eq!(value["status"], json!("avoided"));

    let back: HabitEntry = serde_json::from_value(value).unwrap();
    assert_eq!(back, entry);
}
