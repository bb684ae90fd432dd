//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for items, specialized
//!   records, and the gamification tables.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`ItemNotFound`,
//!   `RecordNotFound`) in addition to DB transport errors.
//! - Soft deletion is the only delete path exposed here.

use crate::db::DbError;
use crate::model::item::{AccountId, ItemId, ItemType};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod gamification_repo;
pub mod item_repo;
pub mod record_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    ItemNotFound(ItemId),
    RecordNotFound {
        item_type: ItemType,
        item_uuid: ItemId,
    },
    AccountNotFound(AccountId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::RecordNotFound {
                item_type,
                item_uuid,
            } => write!(f, "{item_type} record not found for item {item_uuid}"),
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_json(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<serde_json::Value>> {
    match value {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}"))),
        None => Ok(None),
    }
}

pub(crate) fn json_to_text(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|json| json.to_string())
}

/// Current wall-clock timestamp in epoch milliseconds, used for tombstone
/// and update stamps written from Rust rather than SQL defaults.
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
