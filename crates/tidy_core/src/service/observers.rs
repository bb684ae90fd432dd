//! Item lifecycle observers.
//!
//! # Responsibility
//! - Define the lifecycle event stream emitted after dispatch commits.
//! - Feed the gamification engine from create/update/delete events,
//!   detecting completion transitions from explicit before/after records.
//!
//! # Invariants
//! - Observers run after the triggering transaction committed; their
//!   failures are logged by the dispatcher, never propagated.
//! - A completion transition fires only when the previous status was not
//!   `completed` and the new one is.
//! - Non-completion updates award update experience only when the
//!   before/after records actually differ.

use crate::model::item::{Item, ItemType, UserId};
use crate::model::record::{ProgressStatus, SpecializedRecord};
use crate::repo::record_repo::GoalStore;
use crate::service::gamification::{GamificationEngine, GamifyResult};
use rusqlite::Connection;

/// Post-commit lifecycle notification with explicit state snapshots.
#[derive(Debug)]
pub enum LifecycleEvent<'a> {
    Created {
        item: &'a Item,
        record: &'a SpecializedRecord,
    },
    Updated {
        item: &'a Item,
        before: &'a SpecializedRecord,
        after: &'a SpecializedRecord,
    },
    Deleted {
        item: &'a Item,
    },
}

impl LifecycleEvent<'_> {
    pub fn item(&self) -> &Item {
        match self {
            Self::Created { item, .. } | Self::Updated { item, .. } | Self::Deleted { item } => {
                item
            }
        }
    }

    /// The record transitioned into `completed` with this update.
    pub fn completed_now(&self) -> bool {
        let Self::Updated { before, after, .. } = self else {
            return false;
        };
        before.status() != Some(ProgressStatus::Completed)
            && after.status() == Some(ProgressStatus::Completed)
    }
}

/// Side-effect hook invoked after dispatch operations commit.
pub trait LifecycleObserver: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_event(
        &self,
        conn: &Connection,
        user_id: UserId,
        event: &LifecycleEvent<'_>,
    ) -> GamifyResult<()>;
}

/// Routes lifecycle events into the gamification engine.
pub struct GamificationObserver {
    engine: GamificationEngine,
}

impl Default for GamificationObserver {
    fn default() -> Self {
        Self::new(GamificationEngine::new())
    }
}

impl GamificationObserver {
    pub fn new(engine: GamificationEngine) -> Self {
        Self { engine }
    }
}

impl LifecycleObserver for GamificationObserver {
    fn name(&self) -> &'static str {
        "gamification"
    }

    fn on_event(
        &self,
        conn: &Connection,
        user_id: UserId,
        event: &LifecycleEvent<'_>,
    ) -> GamifyResult<()> {
        match event {
            LifecycleEvent::Created { item, .. } => self
                .engine
                .process_element_created(conn, user_id, item.item_type)
                .map(|_| ()),
            LifecycleEvent::Updated {
                item,
                before,
                after,
            } => {
                if !event.completed_now() {
                    if before != after {
                        self.engine
                            .give_experience_for_action(conn, user_id, "element_updated", 1)?;
                    }
                    return Ok(());
                }
                match (item.item_type, after) {
                    (ItemType::Objective, SpecializedRecord::Objective(record)) => {
                        self.engine.give_experience_for_action(
                            conn,
                            user_id,
                            "complete_objective",
                            1,
                        )?;
                        let goal_count = GoalStore::new(conn).count_for_objective(record.id)?;
                        self.engine
                            .process_goal_completed(conn, user_id, goal_count)
                            .map(|_| ())
                    }
                    (ItemType::Goal, _) => {
                        self.engine
                            .give_experience_for_action(conn, user_id, "complete_goal", 1)
                            .map(|_| ())
                    }
                    (ItemType::Event, _) => {
                        self.engine
                            .give_experience_for_action(conn, user_id, "complete_event", 1)
                            .map(|_| ())
                    }
                    _ => Ok(()),
                }
            }
            LifecycleEvent::Deleted { .. } => self
                .engine
                .give_experience_for_action(conn, user_id, "element_deleted", 1)
                .map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_observer<T: LifecycleObserver>() {}

    #[test]
    fn gamification_observer_satisfies_observer_bounds() {
        assert_observer::<GamificationObserver>();
    }
}
