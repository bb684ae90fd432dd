//! Experience, leveling, and achievement engine.
//!
//! # Responsibility
//! - Award experience for actions, derive levels from the configured
//!   curve, and evaluate achievement unlocks per trigger category.
//! - Track daily login streaks and produce a per-user progress summary.
//!
//! # Invariants
//! - Experience awards are atomic per user (see `LevelStore`).
//! - An unlocked achievement is never awarded twice; its reward is
//!   granted through a path that does not re-enter evaluation.
//! - Missing or malformed configuration falls back to built-in defaults
//!   instead of failing the triggering action.

use crate::model::gamification::{
    Achievement, AchievementCategory, ConditionKind, ExperienceResult, LevelCurve, LevelLedger,
};
use crate::model::item::{ItemType, UserId};
use crate::repo::gamification_repo::{AchievementStore, ConfigStore, LevelStore};
use crate::repo::RepoError;
use chrono::{Local, NaiveDate, Timelike, Utc};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GamifyResult<T> = Result<T, GamifyError>;

/// Error surface for engine operations.
#[derive(Debug)]
pub enum GamifyError {
    Repo(RepoError),
    UnknownAction(String),
}

impl Display for GamifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnknownAction(action) => write!(f, "unknown experience action: {action}"),
        }
    }
}

impl Error for GamifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UnknownAction(_) => None,
        }
    }
}

impl From<RepoError> for GamifyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Time source for login streaks and time-window achievements.
///
/// Swapped for a fixed clock in tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
    /// Local hour of day, 0-23.
    fn local_hour(&self) -> u32;
    fn local_date(&self) -> NaiveDate;
}

/// Wall-clock implementation used in production.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }

    fn local_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Receiver for user-facing engine notifications.
pub trait NotificationSink: Send + Sync {
    fn level_up(&self, user_id: UserId, new_level: u32);
    fn achievement_unlocked(&self, user_id: UserId, achievement: &Achievement);
}

/// Default sink: structured log lines only.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn level_up(&self, user_id: UserId, new_level: u32) {
        info!(
            "event=level_up module=gamification user_id={user_id} new_level={new_level}"
        );
    }

    fn achievement_unlocked(&self, user_id: UserId, achievement: &Achievement) {
        info!(
            "event=achievement_unlocked module=gamification user_id={user_id} \
             achievement_id={} name=\"{}\" reward={}",
            achievement.id, achievement.name, achievement.experience_reward
        );
    }
}

/// Built-in action XP, overridable per action via `gamification_config`
/// keys of the form `xp_<action>`.
const DEFAULT_ACTION_XP: &[(&str, i64)] = &[
    ("element_created", 20),
    ("element_updated", 10),
    ("element_deleted", 5),
    ("goal_completed", 50),
    ("create_note", 10),
    ("create_alarm", 15),
    ("create_calendar", 25),
    ("create_event", 10),
    ("create_objective", 20),
    ("create_goal", 25),
    ("complete_objective", 50),
    ("complete_goal", 40),
    ("complete_event", 30),
    ("daily_login", 10),
    ("weekly_streak", 100),
];

/// Objectives with strictly more goals than this unlock the
/// many-goals achievement when completed.
pub const MANY_GOALS_THRESHOLD: i64 = 5;

/// Per-user gamification summary.
#[derive(Debug, Clone)]
pub struct GamificationSummary {
    pub ledger: LevelLedger,
    /// Percentage toward the next level, 0-100.
    pub level_progress: f64,
    /// Cumulative XP needed for the next level, if the curve has one.
    pub next_level_at: Option<i64>,
    pub achievements_completed: i64,
    pub achievements_total: i64,
    /// Share of active achievements completed, 0-100.
    pub achievement_completion_rate: f64,
    /// Most recently unlocked achievements, newest first.
    pub recent_achievements: Vec<Achievement>,
}

/// What a lifecycle hook produced: the experience awarded for the
/// triggering action plus any achievements it unlocked, surfaced to the
/// caller for optional notification.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub experience: Option<ExperienceResult>,
    pub unlocked: Vec<Achievement>,
}

/// Orchestrates experience awards and achievement evaluation.
pub struct GamificationEngine {
    clock: Box<dyn Clock>,
    sink: Box<dyn NotificationSink>,
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GamificationEngine {
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            sink: Box::new(LogSink),
        }
    }

    pub fn with_parts(clock: Box<dyn Clock>, sink: Box<dyn NotificationSink>) -> Self {
        Self { clock, sink }
    }

    /// Level curve from the `level_thresholds` config key, falling back to
    /// the built-in quadratic curve when absent or malformed.
    fn level_curve(&self, conn: &Connection) -> GamifyResult<LevelCurve> {
        let config = ConfigStore::new(conn);
        let Some(text) = config.get("level_thresholds")? else {
            return Ok(LevelCurve::default_curve());
        };
        let parsed: Result<Vec<i64>, _> = serde_json::from_str(&text);
        match parsed.map(LevelCurve::from_thresholds) {
            Ok(Ok(curve)) => Ok(curve),
            Ok(Err(reason)) => {
                warn!(
                    "event=level_curve_invalid module=gamification reason=\"{reason}\" \
                     status=fallback_default"
                );
                Ok(LevelCurve::default_curve())
            }
            Err(err) => {
                warn!(
                    "event=level_curve_invalid module=gamification reason=\"{err}\" \
                     status=fallback_default"
                );
                Ok(LevelCurve::default_curve())
            }
        }
    }

    fn action_xp(&self, conn: &Connection, action: &str) -> GamifyResult<Option<i64>> {
        let default = DEFAULT_ACTION_XP
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, xp)| *xp);
        let Some(default) = default else {
            return Ok(None);
        };
        let config = ConfigStore::new(conn);
        Ok(Some(config.get_i64(&format!("xp_{action}"), default)?))
    }

    /// Awards experience for a named action, scaled by `multiplier`
    /// (values below one count as one). Returns `None` when the action
    /// has no configured experience value.
    pub fn give_experience_for_action(
        &self,
        conn: &Connection,
        user_id: UserId,
        action: &str,
        multiplier: i64,
    ) -> GamifyResult<Option<ExperienceResult>> {
        let Some(amount) = self.action_xp(conn, action)? else {
            warn!(
                "event=experience_skipped module=gamification user_id={user_id} \
                 action={action} status=unknown_action"
            );
            return Ok(None);
        };
        let amount = amount * multiplier.max(1);
        Ok(Some(self.give_experience(conn, user_id, amount, action)?))
    }

    /// Awards a raw amount of experience and re-derives the level.
    ///
    /// Leveling up notifies the sink and evaluates level-reached
    /// achievements against the new level.
    pub fn give_experience(
        &self,
        conn: &Connection,
        user_id: UserId,
        amount: i64,
        reason: &str,
    ) -> GamifyResult<ExperienceResult> {
        let result = self.award(conn, user_id, amount, reason)?;
        if result.leveled_up {
            self.sink.level_up(user_id, result.new_level);
            self.evaluate_category(
                conn,
                user_id,
                AchievementCategory::LevelReached,
                i64::from(result.new_level),
            )?;
        }
        Ok(result)
    }

    /// Internal award path: increments XP and persists the derived level
    /// without evaluating achievements. Used for achievement rewards so
    /// unlocking cannot recurse back into evaluation.
    fn award(
        &self,
        conn: &Connection,
        user_id: UserId,
        amount: i64,
        reason: &str,
    ) -> GamifyResult<ExperienceResult> {
        let curve = self.level_curve(conn)?;
        let mut levels = LevelStore::new(conn);
        let before = levels.get_or_create(user_id)?;
        let total = levels.add_experience(user_id, amount)?;
        let new_level = curve.level_for(total);
        if new_level > before.level {
            levels.set_level(user_id, new_level)?;
        }
        info!(
            "event=experience_awarded module=gamification user_id={user_id} \
             amount={amount} total={total} level={new_level} reason={reason}"
        );
        Ok(ExperienceResult {
            experience_gained: amount,
            total_experience: total,
            new_level,
            leveled_up: new_level > before.level,
        })
    }

    /// Lifecycle hook: an item of `item_type` was created by `user_id`.
    pub fn process_element_created(
        &self,
        conn: &Connection,
        user_id: UserId,
        item_type: ItemType,
    ) -> GamifyResult<ActionOutcome> {
        let experience =
            self.give_experience_for_action(conn, user_id, &format!("create_{item_type}"), 1)?;
        let mut unlocked =
            self.evaluate_category(conn, user_id, AchievementCategory::ElementCreated, 1)?;
        unlocked.extend(self.evaluate_time_based(conn, user_id, self.clock.local_hour())?);
        Ok(ActionOutcome {
            experience,
            unlocked,
        })
    }

    /// Lifecycle hook: an objective transitioned to completed.
    ///
    /// `goal_count` is the number of live goals attached to the objective
    /// at completion time.
    pub fn process_goal_completed(
        &self,
        conn: &Connection,
        user_id: UserId,
        goal_count: i64,
    ) -> GamifyResult<ActionOutcome> {
        let experience = self.give_experience_for_action(conn, user_id, "goal_completed", 1)?;
        let mut unlocked =
            self.evaluate_category(conn, user_id, AchievementCategory::GoalCompleted, 1)?;
        if goal_count > MANY_GOALS_THRESHOLD {
            unlocked.extend(self.evaluate_category(
                conn,
                user_id,
                AchievementCategory::GoalWithManyMetas,
                goal_count,
            )?);
        }
        Ok(ActionOutcome {
            experience,
            unlocked,
        })
    }

    /// Records today's login, extends or resets the streak, and awards
    /// login experience. Returns `None` when today was already counted.
    pub fn process_daily_login(
        &self,
        conn: &Connection,
        user_id: UserId,
    ) -> GamifyResult<Option<ExperienceResult>> {
        let today = self.clock.local_date();
        let today_text = today.format("%Y-%m-%d").to_string();

        let levels = LevelStore::new(conn);
        let ledger = levels.get_or_create(user_id)?;
        if ledger.last_login_date.as_deref() == Some(today_text.as_str()) {
            return Ok(None);
        }

        let yesterday = today.pred_opt().map(|d| d.format("%Y-%m-%d").to_string());
        let streak = if ledger.last_login_date == yesterday {
            ledger.streak_days + 1
        } else {
            1
        };
        levels.set_login_streak(user_id, &today_text, streak)?;
        info!(
            "event=daily_login module=gamification user_id={user_id} \
             date={today_text} streak_days={streak}"
        );

        let result = self.give_experience_for_action(conn, user_id, "daily_login", 1)?;
        if streak > 0 && streak % 7 == 0 {
            self.give_experience_for_action(conn, user_id, "weekly_streak", 1)?;
        }
        self.evaluate_category(conn, user_id, AchievementCategory::DailyStreak, streak)?;
        Ok(result)
    }

    /// Lifecycle hook: the user verified their email address. Returns
    /// the achievements the verification unlocked.
    pub fn grant_email_verified(
        &self,
        conn: &Connection,
        user_id: UserId,
    ) -> GamifyResult<Vec<Achievement>> {
        self.evaluate_category(conn, user_id, AchievementCategory::EmailVerified, 1)
    }

    /// Full progress summary for one user.
    pub fn summary(&self, conn: &Connection, user_id: UserId) -> GamifyResult<GamificationSummary> {
        let curve = self.level_curve(conn)?;
        let levels = LevelStore::new(conn);
        let achievements = AchievementStore::new(conn);

        let ledger = levels.get_or_create(user_id)?;
        let completed = achievements.completed_for_user(user_id)?;
        let achievements_completed = achievements.completed_count(user_id)?;
        let achievements_total = achievements.active_count()?;
        let achievement_completion_rate = if achievements_total > 0 {
            achievements_completed as f64 / achievements_total as f64 * 100.0
        } else {
            0.0
        };
        Ok(GamificationSummary {
            level_progress: curve.level_progress(ledger.total_experience),
            next_level_at: curve.next_threshold(ledger.total_experience),
            achievements_completed,
            achievements_total,
            achievement_completion_rate,
            recent_achievements: completed
                .into_iter()
                .map(|(achievement, _)| achievement)
                .collect(),
            ledger,
        })
    }

    /// Evaluates every active achievement in `category` against a trigger
    /// value and unlocks the ones whose condition is now met.
    ///
    /// `count` conditions treat the value as an increment; absolute
    /// conditions compare it directly against the threshold.
    pub fn evaluate_category(
        &self,
        conn: &Connection,
        user_id: UserId,
        category: AchievementCategory,
        value: i64,
    ) -> GamifyResult<Vec<Achievement>> {
        let store = AchievementStore::new(conn);
        let mut unlocked = Vec::new();
        for achievement in store.active_by_category(category)? {
            let progress = store.progress_or_create(user_id, achievement.id)?;
            if progress.is_completed {
                continue;
            }
            let met = match achievement.condition_kind {
                ConditionKind::Count => {
                    let accumulated = progress.progress + value;
                    let percentage = (accumulated as f64 / achievement.condition_value as f64
                        * 100.0)
                        .min(100.0);
                    store.set_progress(user_id, achievement.id, accumulated, percentage)?;
                    accumulated >= achievement.condition_value
                }
                kind if kind.is_absolute() => {
                    let percentage = (value as f64 / achievement.condition_value as f64 * 100.0)
                        .min(100.0);
                    store.set_progress(user_id, achievement.id, value, percentage)?;
                    value >= achievement.condition_value
                }
                ConditionKind::TimeBased | ConditionKind::Verified => true,
                _ => false,
            };
            if met && self.unlock(conn, user_id, &achievement)? {
                unlocked.push(achievement);
            }
        }
        Ok(unlocked)
    }

    /// Evaluates time-window achievements against the local hour.
    ///
    /// Morning thresholds (12 or below) match hours strictly before the
    /// threshold; evening thresholds match hours at or after it.
    fn evaluate_time_based(
        &self,
        conn: &Connection,
        user_id: UserId,
        hour: u32,
    ) -> GamifyResult<Vec<Achievement>> {
        let store = AchievementStore::new(conn);
        let hour = i64::from(hour);
        let mut unlocked = Vec::new();
        for achievement in store.active_by_category(AchievementCategory::Special)? {
            if achievement.condition_kind != ConditionKind::TimeBased {
                continue;
            }
            let matches = if achievement.condition_value <= 12 {
                hour < achievement.condition_value
            } else {
                hour >= achievement.condition_value
            };
            if !matches {
                continue;
            }
            let progress = store.progress_or_create(user_id, achievement.id)?;
            if !progress.is_completed && self.unlock(conn, user_id, &achievement)? {
                unlocked.push(achievement);
            }
        }
        Ok(unlocked)
    }

    /// One-way unlock. Returns false when a concurrent caller already
    /// completed the row; the reward is awarded exactly once.
    fn unlock(
        &self,
        conn: &Connection,
        user_id: UserId,
        achievement: &Achievement,
    ) -> GamifyResult<bool> {
        let store = AchievementStore::new(conn);
        if !store.complete(user_id, achievement.id)? {
            return Ok(false);
        }
        if achievement.experience_reward > 0 {
            self.award(
                conn,
                user_id,
                achievement.experience_reward,
                "achievement_reward",
            )?;
        }
        self.sink.achievement_unlocked(user_id, achievement);
        Ok(true)
    }
}
