//! Specialized record stores and SQLite implementations.
//!
//! # Responsibility
//! - Provide one persistence store per specialized type (note, alarm,
//!   calendar, event, objective, goal) plus the note kind catalog.
//! - Keep patch semantics (`COALESCE` against previous values) inside the
//!   persistence boundary.
//!
//! # Invariants
//! - Every record row is reached through its owning item uuid.
//! - Patch updates never turn a present column NULL; absent payload
//!   fields keep their previous values.
//! - Soft-deleting an objective cascades to every goal referencing it.

use crate::model::item::ItemId;
use crate::model::record::{
    AlarmRecord, CalendarId, CalendarRecord, EventRecord, GoalRecord, NoteKind, NoteKindId,
    NoteRecord, ObjectiveId, ObjectiveRecord, ProgressStatus,
};
use crate::repo::{json_to_text, now_ms, parse_json, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

fn parse_status(value: &str, column: &str) -> RepoResult<ProgressStatus> {
    ProgressStatus::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid status `{value}` in {column}")))
}

/// Note kind catalog lookups.
pub struct NoteKindStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NoteKindStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, id: NoteKindId) -> RepoResult<Option<NoteKind>> {
        let kind = self
            .conn
            .query_row(
                "SELECT id, name, description, is_premium FROM note_kinds WHERE id = ?1;",
                [id],
                |row| {
                    Ok(NoteKind {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        is_premium: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(kind)
    }

    pub fn list(&self) -> RepoResult<Vec<NoteKind>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, is_premium FROM note_kinds ORDER BY id;")?;
        let mut rows = stmt.query([])?;
        let mut kinds = Vec::new();
        while let Some(row) = rows.next()? {
            kinds.push(NoteKind {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                is_premium: row.get::<_, i64>(3)? != 0,
            });
        }
        Ok(kinds)
    }
}

/// Note record store.
pub struct NoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NoteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &NoteRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notes (id, item_uuid, name, kind_id, content, info, noted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.name.as_str(),
                record.kind_id,
                json_to_text(&record.content),
                record.info.as_deref(),
                record.noted_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<NoteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_uuid, name, kind_id, content, info, noted_at, deleted_at
             FROM notes
             WHERE item_uuid = ?1
               AND deleted_at IS NULL;",
        )?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        content: Option<&serde_json::Value>,
        info: Option<&str>,
        noted_at: Option<i64>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE notes
             SET
                name = COALESCE(?1, name),
                content = COALESCE(?2, content),
                info = COALESCE(?3, info),
                noted_at = COALESCE(?4, noted_at)
             WHERE item_uuid = ?5
               AND deleted_at IS NULL;",
            params![
                name,
                content.map(|json| json.to_string()),
                info,
                noted_at,
                item_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE notes SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<NoteRecord> {
    Ok(NoteRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "notes.id")?,
        item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "notes.item_uuid")?,
        name: row.get("name")?,
        kind_id: row.get("kind_id")?,
        content: parse_json(row.get("content")?, "notes.content")?,
        info: row.get("info")?,
        noted_at: row.get("noted_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Alarm record store.
pub struct AlarmStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> AlarmStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &AlarmRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO alarms
                (id, item_uuid, name, trigger_at, expires_at, volume, location, settings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.name.as_str(),
                record.trigger_at,
                record.expires_at,
                record.volume,
                record.location.as_deref(),
                json_to_text(&record.settings),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<AlarmRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_uuid, name, trigger_at, expires_at, volume, location, settings,
                    deleted_at
             FROM alarms
             WHERE item_uuid = ?1
               AND deleted_at IS NULL;",
        )?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(AlarmRecord {
                id: parse_uuid(&row.get::<_, String>("id")?, "alarms.id")?,
                item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "alarms.item_uuid")?,
                name: row.get("name")?,
                trigger_at: row.get("trigger_at")?,
                expires_at: row.get("expires_at")?,
                volume: row.get("volume")?,
                location: row.get("location")?,
                settings: parse_json(row.get("settings")?, "alarms.settings")?,
                deleted_at: row.get("deleted_at")?,
            }));
        }
        Ok(None)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        trigger_at: Option<i64>,
        expires_at: Option<i64>,
        volume: Option<i64>,
        location: Option<&str>,
        settings: Option<&serde_json::Value>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE alarms
             SET
                name = COALESCE(?1, name),
                trigger_at = COALESCE(?2, trigger_at),
                expires_at = COALESCE(?3, expires_at),
                volume = COALESCE(?4, volume),
                location = COALESCE(?5, location),
                settings = COALESCE(?6, settings)
             WHERE item_uuid = ?7
               AND deleted_at IS NULL;",
            params![
                name,
                trigger_at,
                expires_at,
                volume,
                location,
                settings.map(|json| json.to_string()),
                item_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE alarms SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }
}

/// Calendar record store.
pub struct CalendarStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CalendarStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &CalendarRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO calendars (id, item_uuid, name, color, info)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.name.as_str(),
                record.color.as_str(),
                record.info.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<CalendarRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_uuid, name, color, info, deleted_at
             FROM calendars
             WHERE item_uuid = ?1
               AND deleted_at IS NULL;",
        )?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_calendar_row(row)?));
        }
        Ok(None)
    }

    /// Live lookup by specialized id, used to validate event parents.
    pub fn exists(&self, id: CalendarId) -> RepoResult<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM calendars WHERE id = ?1 AND deleted_at IS NULL
            );",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        color: Option<&str>,
        info: Option<&str>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE calendars
             SET
                name = COALESCE(?1, name),
                color = COALESCE(?2, color),
                info = COALESCE(?3, info)
             WHERE item_uuid = ?4
               AND deleted_at IS NULL;",
            params![name, color, info, item_uuid.to_string()],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE calendars SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }
}

fn parse_calendar_row(row: &Row<'_>) -> RepoResult<CalendarRecord> {
    Ok(CalendarRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "calendars.id")?,
        item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "calendars.item_uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
        info: row.get("info")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Event record store.
pub struct EventStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> EventStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &EventRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO events
                (id, item_uuid, calendar_id, name, status, due_at, info, gps, weather)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.calendar_id.to_string(),
                record.name.as_str(),
                record.status.as_db(),
                record.due_at,
                record.info.as_deref(),
                record.gps.as_deref(),
                record.weather.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_uuid, calendar_id, name, status, due_at, info, gps, weather,
                    deleted_at
             FROM events
             WHERE item_uuid = ?1
               AND deleted_at IS NULL;",
        )?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            let status_text: String = row.get("status")?;
            return Ok(Some(EventRecord {
                id: parse_uuid(&row.get::<_, String>("id")?, "events.id")?,
                item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "events.item_uuid")?,
                calendar_id: parse_uuid(
                    &row.get::<_, String>("calendar_id")?,
                    "events.calendar_id",
                )?,
                name: row.get("name")?,
                status: parse_status(&status_text, "events.status")?,
                due_at: row.get("due_at")?,
                info: row.get("info")?,
                gps: row.get("gps")?,
                weather: row.get("weather")?,
                deleted_at: row.get("deleted_at")?,
            }));
        }
        Ok(None)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        calendar_id: Option<CalendarId>,
        status: Option<ProgressStatus>,
        due_at: Option<i64>,
        info: Option<&str>,
        gps: Option<&str>,
        weather: Option<&str>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE events
             SET
                name = COALESCE(?1, name),
                calendar_id = COALESCE(?2, calendar_id),
                status = COALESCE(?3, status),
                due_at = COALESCE(?4, due_at),
                info = COALESCE(?5, info),
                gps = COALESCE(?6, gps),
                weather = COALESCE(?7, weather)
             WHERE item_uuid = ?8
               AND deleted_at IS NULL;",
            params![
                name,
                calendar_id.map(|id| id.to_string()),
                status.map(ProgressStatus::as_db),
                due_at,
                info,
                gps,
                weather,
                item_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE events SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }
}

/// Objective record store.
pub struct ObjectiveStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ObjectiveStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &ObjectiveRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO objectives
                (id, item_uuid, name, status, category, starts_on, due_on, info)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.name.as_str(),
                record.status.as_db(),
                record.category.as_deref(),
                record.starts_on,
                record.due_on,
                record.info.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<ObjectiveRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OBJECTIVE_SELECT_SQL} WHERE item_uuid = ?1 AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_objective_row(row)?));
        }
        Ok(None)
    }

    /// Live lookup by specialized id, used to validate goal parents.
    pub fn exists(&self, id: ObjectiveId) -> RepoResult<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM objectives WHERE id = ?1 AND deleted_at IS NULL
            );",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        status: Option<ProgressStatus>,
        category: Option<&str>,
        starts_on: Option<i64>,
        due_on: Option<i64>,
        info: Option<&str>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE objectives
             SET
                name = COALESCE(?1, name),
                status = COALESCE(?2, status),
                category = COALESCE(?3, category),
                starts_on = COALESCE(?4, starts_on),
                due_on = COALESCE(?5, due_on),
                info = COALESCE(?6, info)
             WHERE item_uuid = ?7
               AND deleted_at IS NULL;",
            params![
                name,
                status.map(ProgressStatus::as_db),
                category,
                starts_on,
                due_on,
                info,
                item_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE objectives SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }
}

const OBJECTIVE_SELECT_SQL: &str = "SELECT
    id, item_uuid, name, status, category, starts_on, due_on, info, deleted_at
FROM objectives";

fn parse_objective_row(row: &Row<'_>) -> RepoResult<ObjectiveRecord> {
    let status_text: String = row.get("status")?;
    Ok(ObjectiveRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "objectives.id")?,
        item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "objectives.item_uuid")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "objectives.status")?,
        category: row.get("category")?,
        starts_on: row.get("starts_on")?,
        due_on: row.get("due_on")?,
        info: row.get("info")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Goal record store.
pub struct GoalStore<'conn> {
    conn: &'conn Connection,
}

const GOAL_SELECT_SQL: &str = "SELECT
    id, item_uuid, objective_id, name, status, category, starts_on, due_on, info, deleted_at
FROM goals";

impl<'conn> GoalStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &GoalRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO goals
                (id, item_uuid, objective_id, name, status, category, starts_on, due_on, info)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                record.id.to_string(),
                record.item_uuid.to_string(),
                record.objective_id.to_string(),
                record.name.as_str(),
                record.status.as_db(),
                record.category.as_str(),
                record.starts_on,
                record.due_on,
                record.info.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_item(&self, item_uuid: ItemId) -> RepoResult<Option<GoalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL} WHERE item_uuid = ?1 AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([item_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    pub fn list_for_objective(&self, objective_id: ObjectiveId) -> RepoResult<Vec<GoalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE objective_id = ?1
               AND deleted_at IS NULL
             ORDER BY
                CASE status
                    WHEN 'completed' THEN 1
                    WHEN 'in_progress' THEN 2
                    WHEN 'pending' THEN 3
                    ELSE 4
                END,
                id ASC;"
        ))?;
        let mut rows = stmt.query([objective_id.to_string()])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    pub fn count_for_objective(&self, objective_id: ObjectiveId) -> RepoResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM goals WHERE objective_id = ?1 AND deleted_at IS NULL;",
            [objective_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn patch(
        &self,
        item_uuid: ItemId,
        name: Option<&str>,
        objective_id: Option<ObjectiveId>,
        status: Option<ProgressStatus>,
        category: Option<&str>,
        starts_on: Option<i64>,
        due_on: Option<i64>,
        info: Option<&str>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE goals
             SET
                name = COALESCE(?1, name),
                objective_id = COALESCE(?2, objective_id),
                status = COALESCE(?3, status),
                category = COALESCE(?4, category),
                starts_on = COALESCE(?5, starts_on),
                due_on = COALESCE(?6, due_on),
                info = COALESCE(?7, info)
             WHERE item_uuid = ?8
               AND deleted_at IS NULL;",
            params![
                name,
                objective_id.map(|id| id.to_string()),
                status.map(ProgressStatus::as_db),
                category,
                starts_on,
                due_on,
                info,
                item_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_by_item(&self, item_uuid: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE goals SET deleted_at = ?1 WHERE item_uuid = ?2 AND deleted_at IS NULL;",
            params![now_ms(), item_uuid.to_string()],
        )?;
        Ok(())
    }

    /// Cascade used when an objective is soft-deleted: tombstones every
    /// live goal referencing it, along with their item envelopes.
    pub fn soft_delete_for_objective(&self, objective_id: ObjectiveId) -> RepoResult<usize> {
        let stamp = now_ms();
        self.conn.execute(
            "UPDATE items
             SET deleted_at = ?1, updated_at = ?1
             WHERE deleted_at IS NULL
               AND uuid IN (
                   SELECT item_uuid FROM goals
                   WHERE objective_id = ?2 AND deleted_at IS NULL
               );",
            params![stamp, objective_id.to_string()],
        )?;
        let changed = self.conn.execute(
            "UPDATE goals
             SET deleted_at = ?1
             WHERE objective_id = ?2
               AND deleted_at IS NULL;",
            params![stamp, objective_id.to_string()],
        )?;
        Ok(changed)
    }
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<GoalRecord> {
    let status_text: String = row.get("status")?;
    Ok(GoalRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "goals.id")?,
        item_uuid: parse_uuid(&row.get::<_, String>("item_uuid")?, "goals.item_uuid")?,
        objective_id: parse_uuid(&row.get::<_, String>("objective_id")?, "goals.objective_id")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "goals.status")?,
        category: row.get("category")?,
        starts_on: row.get("starts_on")?,
        due_on: row.get("due_on")?,
        info: row.get("info")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Generates a new specialized record id.
pub fn new_record_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db_in_memory;

    #[test]
    fn note_kind_catalog_is_seeded() {
        let conn = open_db_in_memory().unwrap();
        let kinds = NoteKindStore::new(&conn);

        let all = kinds.list().unwrap();
        assert_eq!(all.len(), 9);
        assert_eq!(all.iter().filter(|k| k.is_premium).count(), 3);

        let first = kinds.get(1).unwrap().unwrap();
        assert!(!first.is_premium);
        assert!(kinds.get(999).unwrap().is_none());
    }
}
