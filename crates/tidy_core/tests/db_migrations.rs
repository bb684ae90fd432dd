use rusqlite::Connection;
use tidy_core::db::migrations::latest_version;
use tidy_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "accounts");
    assert_table_exists(&conn, "items");
    assert_table_exists(&conn, "note_kinds");
    assert_table_exists(&conn, "notes");
    assert_table_exists(&conn, "alarms");
    assert_table_exists(&conn, "calendars");
    assert_table_exists(&conn, "events");
    assert_table_exists(&conn, "objectives");
    assert_table_exists(&conn, "goals");
    assert_table_exists(&conn, "user_levels");
    assert_table_exists(&conn, "achievements");
    assert_table_exists(&conn, "user_achievements");
    assert_table_exists(&conn, "gamification_config");
}

#[test]
fn note_kind_catalog_is_seeded() {
    let conn = open_db_in_memory().unwrap();

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_kinds;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 9);

    let premium: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM note_kinds WHERE is_premium = 1;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(premium, 3);
}

#[test]
fn achievement_catalog_and_config_are_seeded() {
    let conn = open_db_in_memory().unwrap();

    let achievements: i64 = conn
        .query_row("SELECT COUNT(*) FROM achievements;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(achievements, 14);

    let create_goal_xp: String = conn
        .query_row(
            "SELECT value FROM gamification_config WHERE key = 'xp_create_goal';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(create_goal_xp, "25");

    let thresholds: String = conn
        .query_row(
            "SELECT value FROM gamification_config WHERE key = 'level_thresholds';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let parsed: Vec<i64> = serde_json::from_str(&thresholds).unwrap();
    assert_eq!(parsed[0], 50);
    assert_eq!(parsed[1], 150);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tidy.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "items");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
