//! Service layer: dispatch orchestration and gamification engine.
//!
//! # Responsibility
//! - Route polymorphic item operations through registered type handlers.
//! - Run the experience/achievement engine off item lifecycle events.
//!
//! # Invariants
//! - Envelope and specialized record mutations commit in one transaction.
//! - Gamification side effects run after commit and never fail the
//!   triggering operation.

use crate::model::item::ItemId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dispatcher;
pub mod gamification;
pub mod handlers;
pub mod observers;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Error surface for dispatch operations.
#[derive(Debug)]
pub enum DispatchError {
    /// No live item with this uuid.
    NotFound(ItemId),
    /// The type tag is not registered with any handler.
    UnsupportedType(String),
    /// Payload failed a semantic check (missing parent, type mismatch).
    Validation(String),
    /// The requested note kind requires an active premium ledger.
    PremiumRequired { kind: String },
    Repo(RepoError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::UnsupportedType(tag) => write!(f, "unsupported item type: {tag}"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::PremiumRequired { kind } => {
                write!(f, "note kind `{kind}` requires an active premium subscription")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DispatchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for DispatchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}
