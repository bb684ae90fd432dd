use chrono::NaiveDate;
use rusqlite::Connection;
use tidy_core::db::open_db_in_memory;
use tidy_core::model::gamification::AchievementCategory;
use tidy_core::model::payload::{
    CreatePayload, EnvelopeFields, GoalCreate, NoteCreate, NotePatch, ObjectiveCreate,
    ObjectivePatch,
};
use tidy_core::model::record::ProgressStatus;
use tidy_core::repo::gamification_repo::{AchievementStore, LevelStore};
use tidy_core::service::gamification::{Clock, GamificationEngine, LogSink};
use tidy_core::service::handlers::HandlerRegistry;
use tidy_core::service::observers::GamificationObserver;
use tidy_core::{ItemDispatcher, ItemType, SpecializedRecord, SqliteItemRepository, UpdatePayload};

const USER_ID: i64 = 7;

/// Deterministic clock for streak and time-window assertions.
struct FixedClock {
    hour: u32,
    date: NaiveDate,
}

impl FixedClock {
    fn at(hour: u32, date: NaiveDate) -> Self {
        Self { hour, date }
    }

    fn noon(date: NaiveDate) -> Self {
        Self::at(12, date)
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        1_750_000_000_000
    }

    fn local_hour(&self) -> u32 {
        self.hour
    }

    fn local_date(&self) -> NaiveDate {
        self.date
    }
}

fn engine_at(hour: u32, date: NaiveDate) -> GamificationEngine {
    GamificationEngine::with_parts(Box::new(FixedClock::at(hour, date)), Box::new(LogSink))
}

fn day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn completed(conn: &Connection, name: &str) -> bool {
    let store = AchievementStore::new(conn);
    for category in [
        AchievementCategory::ElementCreated,
        AchievementCategory::GoalCompleted,
        AchievementCategory::LevelReached,
        AchievementCategory::DailyStreak,
        AchievementCategory::Special,
        AchievementCategory::GoalWithManyMetas,
        AchievementCategory::EmailVerified,
    ] {
        for achievement in store.active_by_category(category).unwrap() {
            if achievement.name == name {
                return store
                    .progress(USER_ID, achievement.id)
                    .unwrap()
                    .map(|progress| progress.is_completed)
                    .unwrap_or(false);
            }
        }
    }
    panic!("unknown achievement name: {name}");
}

#[test]
fn action_experience_comes_from_config() {
    let conn = setup();
    let engine = GamificationEngine::with_parts(
        Box::new(FixedClock::noon(day(1))),
        Box::new(LogSink),
    );

    let result = engine
        .give_experience_for_action(&conn, USER_ID, "create_goal", 1)
        .unwrap()
        .unwrap();
    assert_eq!(result.experience_gained, 25);
    assert_eq!(result.total_experience, 25);
    assert_eq!(result.new_level, 0);
    assert!(!result.leveled_up);

    // The multiplier scales the configured amount.
    let doubled = engine
        .give_experience_for_action(&conn, USER_ID, "create_goal", 2)
        .unwrap()
        .unwrap();
    assert_eq!(doubled.experience_gained, 50);
    assert_eq!(doubled.total_experience, 75);

    assert!(engine
        .give_experience_for_action(&conn, USER_ID, "polish_silverware", 1)
        .unwrap()
        .is_none());
}

#[test]
fn leveling_follows_configured_thresholds() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    // Seeded thresholds: level 1 at 50, level 2 at 150.
    let first = engine.give_experience(&conn, USER_ID, 30, "test").unwrap();
    assert_eq!(first.new_level, 0);
    assert!(!first.leveled_up);

    let second = engine.give_experience(&conn, USER_ID, 25, "test").unwrap();
    assert_eq!(second.total_experience, 55);
    assert_eq!(second.new_level, 1);
    assert!(second.leveled_up);

    let third = engine.give_experience(&conn, USER_ID, 100, "test").unwrap();
    assert_eq!(third.total_experience, 155);
    assert_eq!(third.new_level, 2);
    assert!(third.leveled_up);

    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.level, 2);
    assert_eq!(ledger.total_experience, 155);

    // Level achievements store the measured level even before unlocking.
    let store = AchievementStore::new(&conn);
    let novice = store
        .active_by_category(AchievementCategory::LevelReached)
        .unwrap()
        .into_iter()
        .find(|achievement| achievement.name == "Novice")
        .unwrap();
    let progress = store.progress(USER_ID, novice.id).unwrap().unwrap();
    assert_eq!(progress.progress, 2);
    assert!(!progress.is_completed);
}

#[test]
fn first_creation_unlocks_first_step_once() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    let outcome = engine
        .process_element_created(&conn, USER_ID, ItemType::Note)
        .unwrap();
    assert!(completed(&conn, "First Step"));
    assert_eq!(outcome.unlocked.len(), 1);
    assert_eq!(outcome.unlocked[0].name, "First Step");
    assert_eq!(
        outcome.experience.map(|result| result.experience_gained),
        Some(10)
    );

    // create_note 10 XP plus the 50 XP First Step reward.
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 60);

    let repeat = engine
        .process_element_created(&conn, USER_ID, ItemType::Note)
        .unwrap();
    assert!(repeat.unlocked.is_empty());
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 70);
    assert_eq!(AchievementStore::new(&conn).completed_count(USER_ID).unwrap(), 1);
}

#[test]
fn count_conditions_accumulate_progress() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    for _ in 0..9 {
        engine
            .process_element_created(&conn, USER_ID, ItemType::Alarm)
            .unwrap();
    }
    assert!(!completed(&conn, "Productive"));

    engine
        .process_element_created(&conn, USER_ID, ItemType::Alarm)
        .unwrap();
    assert!(completed(&conn, "Productive"));
}

#[test]
fn objective_with_many_goals_unlocks_master_planner() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    let outcome = engine.process_goal_completed(&conn, USER_ID, 6).unwrap();
    assert!(completed(&conn, "Achiever"));
    assert!(completed(&conn, "Master Planner"));
    let unlocked: Vec<&str> = outcome
        .unlocked
        .iter()
        .map(|achievement| achievement.name.as_str())
        .collect();
    assert_eq!(unlocked, ["Achiever", "Master Planner"]);
    assert_eq!(
        outcome.experience.map(|result| result.experience_gained),
        Some(50)
    );

    // goal_completed 50 + Achiever 100 + Master Planner 500.
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 650);

    // A second qualifying completion awards base XP only.
    engine.process_goal_completed(&conn, USER_ID, 6).unwrap();
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 700);
}

#[test]
fn few_goal_objective_skips_master_planner() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    engine.process_goal_completed(&conn, USER_ID, 5).unwrap();
    assert!(!completed(&conn, "Master Planner"));
}

#[test]
fn time_based_achievements_match_their_window() {
    let conn = setup();

    engine_at(5, day(1))
        .process_element_created(&conn, USER_ID, ItemType::Note)
        .unwrap();
    assert!(completed(&conn, "Early Riser"));
    assert!(!completed(&conn, "Night Owl"));

    engine_at(23, day(1))
        .process_element_created(&conn, USER_ID, ItemType::Note)
        .unwrap();
    assert!(completed(&conn, "Night Owl"));
}

#[test]
fn daily_login_extends_and_resets_streak() {
    let conn = setup();

    let first = engine_at(12, day(1))
        .process_daily_login(&conn, USER_ID)
        .unwrap();
    assert!(first.is_some());
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.streak_days, 1);
    assert_eq!(ledger.total_experience, 10);

    // Same day twice counts once.
    let repeat = engine_at(18, day(1))
        .process_daily_login(&conn, USER_ID)
        .unwrap();
    assert!(repeat.is_none());

    engine_at(12, day(2))
        .process_daily_login(&conn, USER_ID)
        .unwrap();
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.streak_days, 2);

    // A gap resets the streak to one.
    engine_at(12, day(5))
        .process_daily_login(&conn, USER_ID)
        .unwrap();
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.streak_days, 1);
}

#[test]
fn seven_day_streak_awards_bonus_and_achievement() {
    let conn = setup();

    // Day six of an existing streak, logged yesterday.
    let levels = LevelStore::new(&conn);
    levels.get_or_create(USER_ID).unwrap();
    levels
        .set_login_streak(USER_ID, &day(6).format("%Y-%m-%d").to_string(), 6)
        .unwrap();

    engine_at(12, day(7))
        .process_daily_login(&conn, USER_ID)
        .unwrap();

    let ledger = levels.get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.streak_days, 7);
    assert!(completed(&conn, "Consistent"));
    // daily_login 10 + weekly_streak 100 + Consistent 250.
    assert_eq!(ledger.total_experience, 360);

    // The longer streak achievement records the measured streak length.
    let store = AchievementStore::new(&conn);
    let dedicated = store
        .active_by_category(AchievementCategory::DailyStreak)
        .unwrap()
        .into_iter()
        .find(|achievement| achievement.name == "Dedicated")
        .unwrap();
    let progress = store.progress(USER_ID, dedicated.id).unwrap().unwrap();
    assert_eq!(progress.progress, 7);
    assert!(!progress.is_completed);
}

#[test]
fn email_verification_unlocks_achievement() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    let unlocked = engine.grant_email_verified(&conn, USER_ID).unwrap();
    assert!(completed(&conn, "Verified"));
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].name, "Verified");

    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 100);

    // Re-verification does not re-award.
    let repeat = engine.grant_email_verified(&conn, USER_ID).unwrap();
    assert!(repeat.is_empty());
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 100);
}

#[test]
fn summary_reports_ledger_and_achievements() {
    let conn = setup();
    let engine = engine_at(12, day(1));

    engine.grant_email_verified(&conn, USER_ID).unwrap();
    engine.give_experience(&conn, USER_ID, 25, "test").unwrap();

    let summary = engine.summary(&conn, USER_ID).unwrap();
    assert_eq!(summary.ledger.total_experience, 125);
    assert_eq!(summary.ledger.level, 1);
    assert_eq!(summary.achievements_completed, 1);
    assert_eq!(summary.achievements_total, 14);
    assert_eq!(summary.next_level_at, Some(150));
    assert!((summary.achievement_completion_rate - 100.0 / 14.0).abs() < 1e-9);
    assert_eq!(summary.recent_achievements.len(), 1);
    assert_eq!(summary.recent_achievements[0].name, "Verified");
}

#[test]
fn dispatcher_observers_feed_the_engine() {
    let conn = open_db_in_memory().unwrap();
    let account_id = SqliteItemRepository::new(&conn)
        .ensure_account(USER_ID)
        .unwrap();
    let mut conn = conn;
    let dispatcher = ItemDispatcher::new();

    let objective = dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Objective(ObjectiveCreate {
                name: "spring cleaning".to_string(),
                status: None,
                category: None,
                starts_on: None,
                due_on: None,
                info: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap();
    let objective_id = match &objective.record {
        SpecializedRecord::Objective(record) => record.id,
        other => panic!("expected objective record, got {other:?}"),
    };
    assert!(completed(&conn, "First Step"));

    for index in 0..6 {
        dispatcher
            .create(
                &mut conn,
                account_id,
                &CreatePayload::Goal(GoalCreate {
                    name: format!("room {index}"),
                    objective_id,
                    status: None,
                    category: None,
                    starts_on: None,
                    due_on: None,
                    info: None,
                    envelope: EnvelopeFields::default(),
                }),
            )
            .unwrap();
    }

    dispatcher
        .update(
            &mut conn,
            objective.item.uuid,
            &UpdatePayload::Objective(ObjectivePatch {
                status: Some(ProgressStatus::Completed),
                ..Default::default()
            }),
        )
        .unwrap();

    assert!(completed(&conn, "Achiever"));
    assert!(completed(&conn, "Master Planner"));

    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert!(ledger.total_experience > 0);
    assert!(ledger.level > 0);
}

#[test]
fn record_changes_award_update_experience() {
    let conn = open_db_in_memory().unwrap();
    let account_id = SqliteItemRepository::new(&conn)
        .ensure_account(USER_ID)
        .unwrap();
    let mut conn = conn;
    let observer = GamificationObserver::new(engine_at(12, day(1)));
    let dispatcher =
        ItemDispatcher::with_parts(HandlerRegistry::default(), vec![Box::new(observer)]);

    let created = dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Note(NoteCreate {
                name: "draft".to_string(),
                kind_id: 1,
                content: None,
                info: None,
                noted_at: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap();
    // create_note 10 plus the 50 XP First Step reward.
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 60);

    dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Note(NotePatch {
                name: Some("final".to_string()),
                ..Default::default()
            }),
        )
        .unwrap();
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 70);

    // A patch that changes nothing awards nothing.
    dispatcher
        .update(
            &mut conn,
            created.item.uuid,
            &UpdatePayload::Note(NotePatch::default()),
        )
        .unwrap();
    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert_eq!(ledger.total_experience, 70);
}

#[test]
fn premium_gate_ignores_note_creation_when_free() {
    let conn = open_db_in_memory().unwrap();
    let account_id = SqliteItemRepository::new(&conn)
        .ensure_account(USER_ID)
        .unwrap();
    let mut conn = conn;
    let dispatcher = ItemDispatcher::new();

    dispatcher
        .create(
            &mut conn,
            account_id,
            &CreatePayload::Note(NoteCreate {
                name: "free note".to_string(),
                kind_id: 1,
                content: None,
                info: None,
                noted_at: None,
                envelope: EnvelopeFields::default(),
            }),
        )
        .unwrap();

    let ledger = LevelStore::new(&conn).get_or_create(USER_ID).unwrap();
    assert!(ledger.total_experience >= 60);
}
