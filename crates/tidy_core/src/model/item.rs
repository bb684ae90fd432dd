//! Item envelope domain model.
//!
//! # Responsibility
//! - Define the generic envelope record shared by every item type.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another item.
//! - `deleted_at` is the source of truth for tombstone state.
//! - An item with `deleted_at` unset has exactly one live specialized
//!   record of the matching type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an item envelope.
pub type ItemId = Uuid;

/// Storage-assigned identifier for the owning account.
pub type AccountId = i64;

/// Storage-assigned identifier for the account's user, the key the
/// gamification engine is addressed by.
pub type UserId = i64;

/// Discriminator selecting which specialized store a dispatch operation
/// targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Note,
    Alarm,
    Calendar,
    Event,
    Objective,
    Goal,
}

impl ItemType {
    /// All supported type tags in registration order.
    pub const ALL: [ItemType; 6] = [
        ItemType::Note,
        ItemType::Alarm,
        ItemType::Calendar,
        ItemType::Event,
        ItemType::Objective,
        ItemType::Goal,
    ];

    /// Returns the canonical storage/wire tag for this type.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Alarm => "alarm",
            Self::Calendar => "calendar",
            Self::Event => "event",
            Self::Objective => "objective",
            Self::Goal => "goal",
        }
    }

    /// Parses a storage/wire tag. Unknown tags return `None`; callers map
    /// that to `DispatchError::UnsupportedType`.
    pub fn parse_tag(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "alarm" => Some(Self::Alarm),
            "calendar" => Some(Self::Calendar),
            "event" => Some(Self::Event),
            "objective" => Some(Self::Objective),
            "goal" => Some(Self::Goal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Visible lifecycle state of an item envelope.
///
/// Orthogonal to soft deletion: an archived item is still live storage-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Active,
    Inactive,
    Archived,
}

impl ItemState {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Generic envelope entity common to every user-visible object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable global ID used for dispatch, linking and auditing.
    pub uuid: ItemId,
    /// Owning account reference.
    pub account_id: AccountId,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Free-text description, derived from the payload name on create.
    pub description: String,
    /// Visible lifecycle state.
    pub state: ItemState,
    /// Display order inside the account's item list.
    pub position: i64,
    /// Opaque per-type configuration blob.
    pub config: Option<serde_json::Value>,
    /// Soft-delete marker, epoch milliseconds. `None` means live.
    pub deleted_at: Option<i64>,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: i64,
    /// Last update timestamp, epoch milliseconds.
    pub updated_at: i64,
}

impl Item {
    /// Creates a new live envelope with a generated stable ID.
    ///
    /// Timestamps are stamped by the storage layer on insert; the in-memory
    /// values start at zero.
    pub fn new(account_id: AccountId, item_type: ItemType, description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            account_id,
            item_type,
            description: description.into(),
            state: ItemState::Active,
            position: 0,
            config: None,
            deleted_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Returns whether this item should be considered visible/live.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}
