use rusqlite::Connection;
use tidy_core::db::open_db_in_memory;
use tidy_core::model::payload::{
    AlarmCreate, CalendarCreate, CalendarPatch, CreatePayload, EnvelopeFields, EnvelopePatch,
    EventCreate, GoalCreate, GoalPatch, NoteCreate, NotePatch, ObjectiveCreate, ObjectivePatch,
};
use tidy_core::model::record::{CalendarId, ObjectiveId, ProgressStatus};
use tidy_core::repo::gamification_repo::LevelStore;
use tidy_core::repo::record_repo::GoalStore;
use tidy_core::{
    AccountId, DispatchError, ItemDispatcher, ItemListQuery, ItemState, ItemType,
    SpecializedRecord, SqliteItemRepository, Updated, UpdatePayload,
};
use uuid::Uuid;

const USER_ID: i64 = 7;

fn setup() -> (Connection, AccountId) {
    let conn = open_db_in_memory().unwrap();
    let account_id = SqliteItemRepository::new(&conn)
        .ensure_account(USER_ID)
        .unwrap();
    (conn, account_id)
}

fn note_payload(name: &str, kind_id: i64) -> CreatePayload {
    CreatePayload::Note(NoteCreate {
        name: name.to_string(),
        kind_id,
        content: Some(serde_json::json!({ "body": "milk, eggs" })),
        info: None,
        noted_at: None,
        envelope: EnvelopeFields::default(),
    })
}

fn calendar_payload(name: &str) -> CreatePayload {
    CreatePayload::Calendar(CalendarCreate {
        name: name.to_string(),
        color: None,
        info: None,
        envelope: EnvelopeFields::default(),
    })
}

fn objective_payload(name: &str) -> CreatePayload {
    CreatePayload::Objective(ObjectiveCreate {
        name: name.to_string(),
        status: None,
        category: Some("health".to_string()),
        starts_on: None,
        due_on: None,
        info: None,
        envelope: EnvelopeFields::default(),
    })
}

fn goal_payload(name: &str, objective_id: ObjectiveId) -> CreatePayload {
    CreatePayload::Goal(GoalCreate {
        name: name.to_string(),
        objective_id,
        status: None,
        category: None,
        starts_on: None,
        due_on: None,
        info: None,
        envelope: EnvelopeFields::default(),
    })
}

fn created_objective_id(record: &SpecializedRecord) -> ObjectiveId {
    match record {
        SpecializedRecord::Objective(objective) => objective.id,
        other => panic!("expected objective record, got {other:?}"),
    }
}

fn created_calendar_id(record: &SpecializedRecord) -> CalendarId {
    match record {
        SpecializedRecord::Calendar(calendar) => calendar.id,
        other => panic!("expected calendar record, got {other:?}"),
    }
}

#[test]
fn create_note_roundtrip() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("groceries", 1))
        .unwrap();
    assert_eq!(created.item.item_type, ItemType::Note);
    assert_eq!(created.item.description, "groceries");
    assert!(created.item.is_live());

    let view = dispatcher.load(&conn, created.item.uuid).unwrap();
    assert_eq!(view.item.uuid, created.item.uuid);
    match view.record {
        SpecializedRecord::Note(note) => {
            assert_eq!(note.name, "groceries");
            assert_eq!(note.kind_id, 1);
            assert_eq!(
                note.content,
                Some(serde_json::json!({ "body": "milk, eggs" }))
            );
        }
        other => panic!("expected note record, got {other:?}"),
    }
}

#[test]
fn create_applies_type_defaults() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let alarm = dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Alarm(AlarmCreate {
                name: "wake up".to_string(),
                trigger_at: 1_900_000_000_000,
                expires_at: None,
                volume: None,
                location: None,
                settings: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap();
    match alarm.record {
        SpecializedRecord::Alarm(record) => assert_eq!(record.volume, 5),
        other => panic!("expected alarm record, got {other:?}"),
    }

    let calendar = dispatcher
        .create(&mut conn, account_id, &calendar_payload("home"))
        .unwrap();
    match &calendar.record {
        SpecializedRecord::Calendar(record) => assert_eq!(record.color, "#FFFFFF"),
        other => panic!("expected calendar record, got {other:?}"),
    }

    let objective = dispatcher
        .create(&mut conn, account_id, &objective_payload("run a marathon"))
        .unwrap();
    let objective_id = created_objective_id(&objective.record);
    match &objective.record {
        SpecializedRecord::Objective(record) => {
            assert_eq!(record.status, ProgressStatus::Pending)
        }
        other => panic!("expected objective record, got {other:?}"),
    }

    let goal = dispatcher
        .create(&mut conn, account_id, &goal_payload("buy shoes", objective_id))
        .unwrap();
    match goal.record {
        SpecializedRecord::Goal(record) => {
            assert_eq!(record.category, "preparation");
            assert_eq!(record.status, ProgressStatus::Pending);
        }
        other => panic!("expected goal record, got {other:?}"),
    }

    let calendar_id = created_calendar_id(&calendar.record);
    let event = dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Event(EventCreate {
                name: "dentist".to_string(),
                calendar_id,
                status: None,
                due_at: None,
                info: None,
                gps: None,
                weather: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap();
    match event.record {
        SpecializedRecord::Event(record) => assert_eq!(record.status, ProgressStatus::Pending),
        other => panic!("expected event record, got {other:?}"),
    }
}

#[test]
fn premium_note_kind_requires_active_premium() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    // Kind 7 (budget) is seeded premium.
    let err = dispatcher
        .create(&mut conn, account_id, &note_payload("budget 2026", 7))
        .unwrap_err();
    match err {
        DispatchError::PremiumRequired { kind } => assert_eq!(kind, "budget"),
        other => panic!("expected PremiumRequired, got {other}"),
    }

    let far_future_ms = 4_102_444_800_000;
    LevelStore::new(&conn)
        .set_premium(USER_ID, true, Some(far_future_ms))
        .unwrap();
    dispatcher
        .create(&mut conn, account_id, &note_payload("budget 2026", 7))
        .unwrap();

    // An expired flag is treated as non-premium.
    LevelStore::new(&conn)
        .set_premium(USER_ID, true, Some(1_000))
        .unwrap();
    let err = dispatcher
        .create(&mut conn, account_id, &note_payload("budget 2027", 7))
        .unwrap_err();
    assert!(matches!(err, DispatchError::PremiumRequired { .. }));
}

#[test]
fn event_requires_known_calendar() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let err = dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Event(EventCreate {
                name: "orphan".to_string(),
                calendar_id: Uuid::new_v4(),
                status: None,
                due_at: None,
                info: None,
                gps: None,
                weather: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[test]
fn goal_requires_known_objective() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let err = dispatcher
        .create(&mut conn, account_id, &goal_payload("orphan", Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[test]
fn patch_keeps_absent_fields() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("groceries", 1))
        .unwrap();

    let updated = dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Note(NotePatch {
                content: Some(serde_json::json!({ "body": "bread" })),
                ..Default::default()
            }),
        )
        .unwrap();

    match updated {
        Updated::Item { item, record } => {
            assert_eq!(item.description, "groceries");
            match record {
                SpecializedRecord::Note(note) => {
                    assert_eq!(note.name, "groceries");
                    assert_eq!(note.content, Some(serde_json::json!({ "body": "bread" })));
                }
                other => panic!("expected note record, got {other:?}"),
            }
        }
        Updated::Goal(_) => panic!("note update must return the full item"),
    }
}

#[test]
fn update_name_mirrors_envelope_description() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &calendar_payload("home"))
        .unwrap();
    let updated = dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Calendar(CalendarPatch {
                name: Some("family".to_string()),
                ..Default::default()
            }),
        )
        .unwrap();
    match updated {
        Updated::Item { item, .. } => assert_eq!(item.description, "family"),
        Updated::Goal(_) => panic!("calendar update must return the full item"),
    }
}

#[test]
fn update_patches_envelope_state_and_position() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("old project", 1))
        .unwrap();
    let updated = dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Note(NotePatch {
                envelope: EnvelopePatch {
                    state: Some(ItemState::Archived),
                    position: Some(9),
                    config: None,
                },
                ..Default::default()
            }),
        )
        .unwrap();

    match updated {
        Updated::Item { item, .. } => {
            assert_eq!(item.state, ItemState::Archived);
            assert_eq!(item.position, 9);
            assert_eq!(item.description, "old project");
        }
        Updated::Goal(_) => panic!("note update must return the full item"),
    }
}

#[test]
fn goal_update_skips_envelope() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let objective = dispatcher
        .create(&mut conn, account_id, &objective_payload("read more"))
        .unwrap();
    let objective_id = created_objective_id(&objective.record);
    let goal = dispatcher
        .create(&mut conn, account_id, &goal_payload("join library", objective_id))
        .unwrap();

    let updated = dispatcher
        .update(
            &mut conn,
            goal.item.uuid,
            &UpdatePayload::Goal(GoalPatch {
                name: Some("join the city library".to_string()),
                status: Some(ProgressStatus::Completed),
                ..Default::default()
            }),
        )
        .unwrap();
    match updated {
        Updated::Goal(record) => {
            assert_eq!(record.name, "join the city library");
            assert_eq!(record.status, ProgressStatus::Completed);
        }
        Updated::Item { .. } => panic!("goal update must return the goal record alone"),
    }

    // Envelope stays untouched: description and updated_at keep their
    // create-time values.
    let envelope = dispatcher.load(&conn, goal.item.uuid).unwrap().item;
    assert_eq!(envelope.description, "join library");
    assert_eq!(envelope.updated_at, goal.item.updated_at);
}

#[test]
fn record_only_patch_leaves_envelope_untouched() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("groceries", 1))
        .unwrap();
    conn.execute(
        "UPDATE items SET updated_at = 1 WHERE uuid = ?1;",
        [created.item.uuid.to_string()],
    )
    .unwrap();

    dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Note(NotePatch {
                info: Some("pantry".to_string()),
                ..Default::default()
            }),
        )
        .unwrap();

    let view = dispatcher.load(&conn, created.item.uuid).unwrap();
    assert_eq!(view.item.updated_at, 1);
    match view.record {
        SpecializedRecord::Note(note) => assert_eq!(note.info.as_deref(), Some("pantry")),
        other => panic!("expected note record, got {other:?}"),
    }
}

#[test]
fn goals_list_completed_first_for_objective() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let objective = dispatcher
        .create(&mut conn, account_id, &objective_payload("fitness"))
        .unwrap();
    let objective_id = created_objective_id(&objective.record);

    let first = dispatcher
        .create(&mut conn, account_id, &goal_payload("stretch", objective_id))
        .unwrap();
    let second = dispatcher
        .create(&mut conn, account_id, &goal_payload("run", objective_id))
        .unwrap();
    dispatcher
        .create(&mut conn, account_id, &goal_payload("swim", objective_id))
        .unwrap();

    dispatcher
        .update(
            &mut conn,
            first.item.uuid,
            &UpdatePayload::Goal(GoalPatch {
                status: Some(ProgressStatus::InProgress),
                ..Default::default()
            }),
        )
        .unwrap();
    dispatcher
        .update(
            &mut conn,
            second.item.uuid,
            &UpdatePayload::Goal(GoalPatch {
                status: Some(ProgressStatus::Completed),
                ..Default::default()
            }),
        )
        .unwrap();

    let goals = GoalStore::new(&conn)
        .list_for_objective(objective_id)
        .unwrap();
    let names: Vec<&str> = goals.iter().map(|goal| goal.name.as_str()).collect();
    assert_eq!(names, ["run", "stretch", "swim"]);
}

#[test]
fn update_rejects_mismatched_payload_type() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("groceries", 1))
        .unwrap();
    let err = dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Objective(ObjectivePatch::default()),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[test]
fn update_missing_item_returns_not_found() {
    let (mut conn, _account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let missing = Uuid::new_v4();
    let err = dispatcher
        .update(&mut conn, missing, &UpdatePayload::Note(NotePatch::default()))
        .unwrap_err();
    match err {
        DispatchError::NotFound(id) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {other}"),
    }
}

#[test]
fn delete_objective_cascades_goals() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let objective = dispatcher
        .create(&mut conn, account_id, &objective_payload("declutter"))
        .unwrap();
    let objective_id = created_objective_id(&objective.record);
    let goal_a = dispatcher
        .create(&mut conn, account_id, &goal_payload("sort closet", objective_id))
        .unwrap();
    let goal_b = dispatcher
        .create(&mut conn, account_id, &goal_payload("sell books", objective_id))
        .unwrap();

    dispatcher.delete(&mut conn, objective.item.uuid).unwrap();

    for uuid in [objective.item.uuid, goal_a.item.uuid, goal_b.item.uuid] {
        let err = dispatcher.load(&conn, uuid).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }
}

#[test]
fn delete_is_not_repeatable() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("once", 1))
        .unwrap();
    dispatcher.delete(&mut conn, created.item.uuid).unwrap();

    let err = dispatcher.delete(&mut conn, created.item.uuid).unwrap_err();
    assert!(matches!(err, DispatchError::NotFound(_)));
}

#[test]
fn list_filters_by_type_and_orders_by_position() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let note = dispatcher
        .create(&mut conn, account_id, &note_payload("first", 1))
        .unwrap();
    let calendar = dispatcher
        .create(&mut conn, account_id, &calendar_payload("home"))
        .unwrap();
    let second_note = dispatcher
        .create(&mut conn, account_id, &note_payload("second", 1))
        .unwrap();

    dispatcher
        .reorder(
            &conn,
            account_id,
            &[(note.item.uuid, 2), (second_note.item.uuid, 1)],
        )
        .unwrap();

    let all = dispatcher
        .list(&conn, account_id, &ItemListQuery::default())
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].uuid, calendar.item.uuid);

    let notes = dispatcher
        .list(
            &conn,
            account_id,
            &ItemListQuery {
                item_type: Some(ItemType::Note),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].uuid, second_note.item.uuid);
    assert_eq!(notes[1].uuid, note.item.uuid);
}

#[test]
fn deleted_items_are_hidden_from_list() {
    let (mut conn, account_id) = setup();
    let dispatcher = ItemDispatcher::bare();

    let created = dispatcher
        .create(&mut conn, account_id, &note_payload("ghost", 1))
        .unwrap();
    dispatcher.delete(&mut conn, created.item.uuid).unwrap();

    let visible = dispatcher
        .list(&conn, account_id, &ItemListQuery::default())
        .unwrap();
    assert!(visible.is_empty());

    let with_deleted = dispatcher
        .list(
            &conn,
            account_id,
            &ItemListQuery {
                include_deleted: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(with_deleted.len(), 1);
    assert!(!with_deleted[0].is_live());
}
