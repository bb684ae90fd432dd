//! Gamification persistence: level ledger, achievements, config store.
//!
//! # Responsibility
//! - Maintain the per-user level ledger with atomic experience increments.
//! - Query the achievement catalog and per-user progress rows.
//! - Expose the key/value gamification configuration table.
//!
//! # Invariants
//! - `add_experience` increments and reads back inside one immediate
//!   transaction, so concurrent awards never lose experience.
//! - Ledger level writes are monotonic; interleaved awards can land in
//!   any order without regressing the level.
//! - At most one progress row exists per (user, achievement); completion
//!   is a one-way transition guarded in SQL.

use crate::model::gamification::{
    Achievement, AchievementCategory, AchievementId, AchievementProgress, ConditionKind,
    LevelLedger,
};
use crate::model::item::UserId;
use crate::repo::{bool_to_int, now_ms, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const LEDGER_SELECT_SQL: &str = "SELECT
    user_id, level, total_experience, is_premium, premium_expires_at,
    streak_days, last_login_date
FROM user_levels";

const ACHIEVEMENT_SELECT_SQL: &str = "SELECT
    id, name, description, icon, category, condition_kind, condition_value,
    experience_reward, is_active
FROM achievements";

/// Level ledger store.
pub struct LevelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LevelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, user_id: UserId) -> RepoResult<Option<LevelLedger>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LEDGER_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_ledger_row(row)?));
        }
        Ok(None)
    }

    /// Fetches the ledger, creating a fresh level-0 row on first contact.
    pub fn get_or_create(&self, user_id: UserId) -> RepoResult<LevelLedger> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_levels (user_id) VALUES (?1);",
            [user_id],
        )?;
        self.get(user_id)?
            .ok_or_else(|| RepoError::InvalidData(format!("ledger missing for user {user_id}")))
    }

    /// Atomically adds `amount` experience and returns the new total.
    ///
    /// The increment and the read-back happen inside one immediate
    /// transaction; callers derive the level from the returned total and
    /// persist it via `set_level`.
    pub fn add_experience(&mut self, user_id: UserId, amount: i64) -> RepoResult<i64> {
        let tx = rusqlite::Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT OR IGNORE INTO user_levels (user_id) VALUES (?1);",
            [user_id],
        )?;
        tx.execute(
            "UPDATE user_levels
             SET total_experience = total_experience + ?1, updated_at = ?2
             WHERE user_id = ?3;",
            params![amount, now_ms(), user_id],
        )?;
        let total: i64 = tx.query_row(
            "SELECT total_experience FROM user_levels WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(total)
    }

    /// Raises the ledger level. A value at or below the stored level is
    /// ignored, so out-of-order writes from concurrent awards cannot
    /// regress the ledger below the level its experience implies.
    pub fn set_level(&self, user_id: UserId, level: u32) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE user_levels
             SET level = ?1, updated_at = ?2
             WHERE user_id = ?3 AND level < ?1;",
            params![level as i64, now_ms(), user_id],
        )?;
        Ok(())
    }

    pub fn set_premium(
        &self,
        user_id: UserId,
        is_premium: bool,
        expires_at: Option<i64>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_levels (user_id) VALUES (?1);",
            [user_id],
        )?;
        self.conn.execute(
            "UPDATE user_levels
             SET is_premium = ?1, premium_expires_at = ?2, updated_at = ?3
             WHERE user_id = ?4;",
            params![bool_to_int(is_premium), expires_at, now_ms(), user_id],
        )?;
        Ok(())
    }

    /// Records a daily login: stores the login date and the new streak
    /// length in one statement.
    pub fn set_login_streak(
        &self,
        user_id: UserId,
        login_date: &str,
        streak_days: i64,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE user_levels
             SET last_login_date = ?1, streak_days = ?2, updated_at = ?3
             WHERE user_id = ?4;",
            params![login_date, streak_days, now_ms(), user_id],
        )?;
        Ok(())
    }
}

fn parse_ledger_row(row: &Row<'_>) -> RepoResult<LevelLedger> {
    Ok(LevelLedger {
        user_id: row.get("user_id")?,
        level: row.get::<_, i64>("level")? as u32,
        total_experience: row.get("total_experience")?,
        is_premium: row.get::<_, i64>("is_premium")? != 0,
        premium_expires_at: row.get("premium_expires_at")?,
        streak_days: row.get("streak_days")?,
        last_login_date: row.get("last_login_date")?,
    })
}

/// Achievement catalog and per-user progress store.
pub struct AchievementStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> AchievementStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Active catalog rows for one trigger category.
    pub fn active_by_category(
        &self,
        category: AchievementCategory,
    ) -> RepoResult<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACHIEVEMENT_SELECT_SQL} WHERE category = ?1 AND is_active = 1 ORDER BY id;"
        ))?;
        let mut rows = stmt.query([category.as_db()])?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(parse_achievement_row(row)?);
        }
        Ok(achievements)
    }

    /// Fetches a user's progress row, creating a zeroed one if absent.
    pub fn progress_or_create(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
    ) -> RepoResult<AchievementProgress> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id)
             VALUES (?1, ?2);",
            params![user_id, achievement_id],
        )?;
        self.progress(user_id, achievement_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "progress row missing for user {user_id} achievement {achievement_id}"
            ))
        })
    }

    pub fn progress(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
    ) -> RepoResult<Option<AchievementProgress>> {
        let progress = self
            .conn
            .query_row(
                "SELECT user_id, achievement_id, progress, progress_percentage,
                        is_completed, completed_at
                 FROM user_achievements
                 WHERE user_id = ?1 AND achievement_id = ?2;",
                params![user_id, achievement_id],
                |row| {
                    Ok(AchievementProgress {
                        user_id: row.get(0)?,
                        achievement_id: row.get(1)?,
                        progress: row.get(2)?,
                        progress_percentage: row.get(3)?,
                        is_completed: row.get::<_, i64>(4)? != 0,
                        completed_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(progress)
    }

    pub fn set_progress(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
        progress: i64,
        progress_percentage: f64,
    ) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE user_achievements
             SET progress = ?1, progress_percentage = ?2
             WHERE user_id = ?3 AND achievement_id = ?4 AND is_completed = 0;",
            params![progress, progress_percentage, user_id, achievement_id],
        )?;
        Ok(())
    }

    /// Marks an achievement completed. Returns false when it was already
    /// completed, making repeated unlock attempts idempotent.
    pub fn complete(&self, user_id: UserId, achievement_id: AchievementId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE user_achievements
             SET is_completed = 1, progress_percentage = 100.0, completed_at = ?1
             WHERE user_id = ?2 AND achievement_id = ?3 AND is_completed = 0;",
            params![now_ms(), user_id, achievement_id],
        )?;
        Ok(changed > 0)
    }

    pub fn completed_count(&self, user_id: UserId) -> RepoResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_achievements
             WHERE user_id = ?1 AND is_completed = 1;",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn active_count(&self) -> RepoResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM achievements WHERE is_active = 1;",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Completed achievements joined with their catalog rows, newest first.
    pub fn completed_for_user(
        &self,
        user_id: UserId,
    ) -> RepoResult<Vec<(Achievement, AchievementProgress)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.id, a.name, a.description, a.icon, a.category, a.condition_kind,
                a.condition_value, a.experience_reward, a.is_active,
                ua.user_id, ua.progress, ua.progress_percentage, ua.is_completed,
                ua.completed_at
             FROM user_achievements ua
             JOIN achievements a ON a.id = ua.achievement_id
             WHERE ua.user_id = ?1 AND ua.is_completed = 1
             ORDER BY ua.completed_at DESC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut completed = Vec::new();
        while let Some(row) = rows.next()? {
            let achievement = parse_achievement_row(row)?;
            let progress = AchievementProgress {
                user_id: row.get("user_id")?,
                achievement_id: achievement.id,
                progress: row.get("progress")?,
                progress_percentage: row.get("progress_percentage")?,
                is_completed: row.get::<_, i64>("is_completed")? != 0,
                completed_at: row.get("completed_at")?,
            };
            completed.push((achievement, progress));
        }
        Ok(completed)
    }
}

fn parse_achievement_row(row: &Row<'_>) -> RepoResult<Achievement> {
    let category_text: String = row.get("category")?;
    let kind_text: String = row.get("condition_kind")?;
    Ok(Achievement {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        icon: row.get("icon")?,
        category: AchievementCategory::parse(&category_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid achievement category `{category_text}` in achievements.category"
            ))
        })?,
        condition_kind: ConditionKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid condition kind `{kind_text}` in achievements.condition_kind"
            ))
        })?,
        condition_value: row.get("condition_value")?,
        experience_reward: row.get("experience_reward")?,
        is_active: row.get::<_, i64>("is_active")? != 0,
    })
}

/// Key/value gamification configuration store.
pub struct ConfigStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ConfigStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM gamification_config WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Integer config value, falling back to `default` when the key is
    /// absent or not numeric.
    pub fn get_i64(&self, key: &str, default: i64) -> RepoResult<i64> {
        Ok(self
            .get(key)?
            .and_then(|text| text.trim().parse().ok())
            .unwrap_or(default))
    }

    pub fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO gamification_config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AchievementStore, ConfigStore, LevelStore};
    use crate::db::open_db_in_memory;
    use crate::model::gamification::AchievementCategory;

    #[test]
    fn ledger_starts_at_level_zero() {
        let conn = open_db_in_memory().unwrap();
        let store = LevelStore::new(&conn);
        let ledger = store.get_or_create(7).unwrap();
        assert_eq!(ledger.level, 0);
        assert_eq!(ledger.total_experience, 0);
        assert!(!ledger.is_premium);
    }

    #[test]
    fn add_experience_accumulates() {
        let conn = open_db_in_memory().unwrap();
        let mut store = LevelStore::new(&conn);
        assert_eq!(store.add_experience(7, 20).unwrap(), 20);
        assert_eq!(store.add_experience(7, 30).unwrap(), 50);
    }

    #[test]
    fn level_never_decreases() {
        let conn = open_db_in_memory().unwrap();
        let store = LevelStore::new(&conn);
        store.get_or_create(7).unwrap();
        store.set_level(7, 2).unwrap();
        store.set_level(7, 1).unwrap();
        assert_eq!(store.get_or_create(7).unwrap().level, 2);
    }

    #[test]
    fn complete_is_one_way() {
        let conn = open_db_in_memory().unwrap();
        let store = AchievementStore::new(&conn);
        let catalog = store
            .active_by_category(AchievementCategory::ElementCreated)
            .unwrap();
        let first = &catalog[0];
        store.progress_or_create(7, first.id).unwrap();
        assert!(store.complete(7, first.id).unwrap());
        assert!(!store.complete(7, first.id).unwrap());
        assert_eq!(store.completed_count(7).unwrap(), 1);
    }

    #[test]
    fn config_overrides_and_defaults() {
        let conn = open_db_in_memory().unwrap();
        let store = ConfigStore::new(&conn);
        assert_eq!(store.get_i64("xp_create_goal", 0).unwrap(), 25);
        assert_eq!(store.get_i64("xp_missing_key", 42).unwrap(), 42);
        store.set("xp_create_goal", "99").unwrap();
        assert_eq!(store.get_i64("xp_create_goal", 0).unwrap(), 99);
    }
}
