//! Gamification domain model: level ledger, level curve, achievements.
//!
//! # Responsibility
//! - Define the per-user level ledger and the curve mapping cumulative
//!   experience to a level.
//! - Define the achievement catalog row and per-user progress row.
//!
//! # Invariants
//! - `total_experience` is monotonically non-decreasing.
//! - `level` is always the largest level whose cumulative-XP threshold is
//!   <= `total_experience`.
//! - A completed progress row is never re-evaluated or re-awarded.

use crate::model::item::UserId;
use serde::{Deserialize, Serialize};

/// Storage-assigned identifier for an achievement catalog row.
pub type AchievementId = i64;

/// Per-user accumulated experience and derived level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLedger {
    pub user_id: UserId,
    pub level: u32,
    pub total_experience: i64,
    pub is_premium: bool,
    pub premium_expires_at: Option<i64>,
    pub streak_days: i64,
    /// Last daily-login date, `YYYY-MM-DD`.
    pub last_login_date: Option<String>,
}

impl LevelLedger {
    /// Whether the premium flag is set and not past its expiry.
    pub fn is_premium_active(&self, now_ms: i64) -> bool {
        self.is_premium && self.premium_expires_at.is_some_and(|expiry| expiry > now_ms)
    }
}

/// Outcome of one experience award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceResult {
    pub experience_gained: i64,
    pub total_experience: i64,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Monotonic step function mapping cumulative experience to a level.
///
/// Thresholds are cumulative: `thresholds[n]` is the experience needed to
/// reach level `n + 1`. Level 0 needs nothing. The values come from
/// external configuration (`level_thresholds`), not from engine logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCurve {
    thresholds: Vec<i64>,
}

/// Highest level the default curve is generated for.
const DEFAULT_CURVE_MAX_LEVEL: u32 = 50;

impl LevelCurve {
    /// Builds a curve from externally configured cumulative thresholds.
    ///
    /// Non-increasing threshold lists are rejected with a description of
    /// the offending position.
    pub fn from_thresholds(thresholds: Vec<i64>) -> Result<Self, String> {
        let mut previous = 0_i64;
        for (index, value) in thresholds.iter().enumerate() {
            if *value <= previous {
                return Err(format!(
                    "level thresholds must be strictly increasing and positive, \
                     got {value} at position {index}"
                ));
            }
            previous = *value;
        }
        Ok(Self { thresholds })
    }

    /// Default quadratic curve: level `n` at `25 * n * (n + 1)` cumulative
    /// XP (level 1 at 50, level 2 at 150, level 5 at 750).
    pub fn default_curve() -> Self {
        let thresholds = (1..=DEFAULT_CURVE_MAX_LEVEL as i64)
            .map(|level| 25 * level * (level + 1))
            .collect();
        Self { thresholds }
    }

    /// Largest level whose cumulative threshold is <= `total_experience`.
    pub fn level_for(&self, total_experience: i64) -> u32 {
        self.thresholds
            .iter()
            .take_while(|threshold| **threshold <= total_experience)
            .count() as u32
    }

    /// Cumulative experience required for the next level, or `None` when
    /// the curve is exhausted.
    pub fn next_threshold(&self, total_experience: i64) -> Option<i64> {
        let level = self.level_for(total_experience) as usize;
        self.thresholds.get(level).copied()
    }

    /// Percentage progress from the current level threshold toward the
    /// next one. 100 when the curve is exhausted.
    pub fn level_progress(&self, total_experience: i64) -> f64 {
        let level = self.level_for(total_experience) as usize;
        let floor = if level == 0 {
            0
        } else {
            self.thresholds[level - 1]
        };
        let Some(ceiling) = self.thresholds.get(level) else {
            return 100.0;
        };
        let span = ceiling - floor;
        if span <= 0 {
            return 100.0;
        }
        ((total_experience - floor) as f64 / span as f64 * 100.0 * 100.0).round() / 100.0
    }
}

/// Achievement trigger category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    ElementCreated,
    GoalCompleted,
    LevelReached,
    DailyStreak,
    Special,
    GoalWithManyMetas,
    EmailVerified,
}

impl AchievementCategory {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::ElementCreated => "element_created",
            Self::GoalCompleted => "goal_completed",
            Self::LevelReached => "level_reached",
            Self::DailyStreak => "daily_streak",
            Self::Special => "special",
            Self::GoalWithManyMetas => "goal_with_many_metas",
            Self::EmailVerified => "email_verified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "element_created" => Some(Self::ElementCreated),
            "goal_completed" => Some(Self::GoalCompleted),
            "level_reached" => Some(Self::LevelReached),
            "daily_streak" => Some(Self::DailyStreak),
            "special" => Some(Self::Special),
            "goal_with_many_metas" => Some(Self::GoalWithManyMetas),
            "email_verified" => Some(Self::EmailVerified),
            _ => None,
        }
    }
}

/// How an achievement condition is evaluated against the trigger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Progress accumulates by the trigger value; unlock at threshold.
    Count,
    /// Absolute comparison against the user's level.
    Level,
    /// Absolute comparison against the streak length.
    Days,
    /// Unlocks directly when the time window matches.
    TimeBased,
    /// Absolute comparison against a goal count.
    MetasCount,
    /// Unlocks directly on verification.
    Verified,
}

impl ConditionKind {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Level => "level",
            Self::Days => "days",
            Self::TimeBased => "time_based",
            Self::MetasCount => "metas_count",
            Self::Verified => "verified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "count" => Some(Self::Count),
            "level" => Some(Self::Level),
            "days" => Some(Self::Days),
            "time_based" => Some(Self::TimeBased),
            "metas_count" => Some(Self::MetasCount),
            "verified" => Some(Self::Verified),
            _ => None,
        }
    }

    /// Whether the trigger value is an absolute measurement (level, streak
    /// length, goal count) rather than an increment.
    pub fn is_absolute(self) -> bool {
        matches!(self, Self::Level | Self::Days | Self::MetasCount)
    }
}

/// Catalog row describing one unlockable achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub category: AchievementCategory,
    pub condition_kind: ConditionKind,
    pub condition_value: i64,
    pub experience_reward: i64,
    pub is_active: bool,
}

/// Per-user progress toward one achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub user_id: UserId,
    pub achievement_id: AchievementId,
    pub progress: i64,
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
}
