//! Core domain logic for Tidy.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{AccountId, Item, ItemId, ItemState, ItemType, UserId};
pub use model::payload::{CreatePayload, UpdatePayload};
pub use model::record::{ProgressStatus, SpecializedRecord};
pub use repo::item_repo::{ItemListQuery, ItemRepository, SqliteItemRepository};
pub use repo::{RepoError, RepoResult};
pub use service::dispatcher::{CreatedItem, ItemDispatcher, ItemView, Updated};
pub use service::gamification::{
    ActionOutcome, GamificationEngine, GamificationSummary, GamifyError,
};
pub use service::{DispatchError, DispatchResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
