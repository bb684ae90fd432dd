//! Specialized record domain model.
//!
//! # Responsibility
//! - Define the six type-specific records owned 1:1 by an `Item`.
//! - Provide the `SpecializedRecord` sum passed to lifecycle observers.
//!
//! # Invariants
//! - Every record back-references exactly one item by `item_uuid`.
//! - A goal's `objective_id` points at an objective specialized record,
//!   never at the objective's item uuid.
//! - Status transitions are caller-supplied, never computed here.

use crate::model::item::{ItemId, ItemType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NoteId = Uuid;
pub type AlarmId = Uuid;
pub type CalendarId = Uuid;
pub type EventId = Uuid;
pub type ObjectiveId = Uuid;
pub type GoalId = Uuid;

/// Storage-assigned identifier for a note kind catalog row.
pub type NoteKindId = i64;

/// Shared progress state for objectives, goals, and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Catalog row describing a note kind and its premium gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteKind {
    pub id: NoteKindId,
    pub name: String,
    pub description: Option<String>,
    pub is_premium: bool,
}

/// Free-form note with a typed content blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub item_uuid: ItemId,
    pub name: String,
    pub kind_id: NoteKindId,
    /// Typed content blob; shape depends on the note kind.
    pub content: Option<serde_json::Value>,
    pub info: Option<String>,
    /// User-facing note date, epoch milliseconds.
    pub noted_at: Option<i64>,
    pub deleted_at: Option<i64>,
}

/// Alarm with trigger/expiry times and an optional geofence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub id: AlarmId,
    pub item_uuid: ItemId,
    pub name: String,
    /// Trigger instant, epoch milliseconds.
    pub trigger_at: i64,
    /// Expiry instant, epoch milliseconds.
    pub expires_at: Option<i64>,
    /// Volume intensity 0-10. Defaults to 5 when absent from the payload.
    pub volume: i64,
    /// Geofence location descriptor.
    pub location: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub deleted_at: Option<i64>,
}

/// Calendar container for events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub id: CalendarId,
    pub item_uuid: ItemId,
    pub name: String,
    /// Display color. Defaults to `#FFFFFF` when absent from the payload.
    pub color: String,
    pub info: Option<String>,
    pub deleted_at: Option<i64>,
}

/// Calendar event with completion tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub item_uuid: ItemId,
    /// Owning calendar specialized record.
    pub calendar_id: CalendarId,
    pub name: String,
    pub status: ProgressStatus,
    pub due_at: Option<i64>,
    pub info: Option<String>,
    pub gps: Option<String>,
    pub weather: Option<String>,
    pub deleted_at: Option<i64>,
}

/// Objective grouping a set of goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub id: ObjectiveId,
    pub item_uuid: ItemId,
    pub name: String,
    pub status: ProgressStatus,
    pub category: Option<String>,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
    pub deleted_at: Option<i64>,
}

/// Goal (meta): a sub-unit of an objective, counted for the
/// "goal with many metas" achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: GoalId,
    pub item_uuid: ItemId,
    /// Parent objective specialized id, not the objective's item uuid.
    pub objective_id: ObjectiveId,
    pub name: String,
    pub status: ProgressStatus,
    /// Goal category. Defaults to `preparation` when absent.
    pub category: String,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
    pub deleted_at: Option<i64>,
}

/// Sum over every specialized record shape.
///
/// Returned by handler loads and handed to lifecycle observers so "did the
/// status change to completed" is computed from explicit before/after
/// values instead of implicit dirty tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecializedRecord {
    Note(NoteRecord),
    Alarm(AlarmRecord),
    Calendar(CalendarRecord),
    Event(EventRecord),
    Objective(ObjectiveRecord),
    Goal(GoalRecord),
}

impl SpecializedRecord {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Note(_) => ItemType::Note,
            Self::Alarm(_) => ItemType::Alarm,
            Self::Calendar(_) => ItemType::Calendar,
            Self::Event(_) => ItemType::Event,
            Self::Objective(_) => ItemType::Objective,
            Self::Goal(_) => ItemType::Goal,
        }
    }

    pub fn item_uuid(&self) -> ItemId {
        match self {
            Self::Note(record) => record.item_uuid,
            Self::Alarm(record) => record.item_uuid,
            Self::Calendar(record) => record.item_uuid,
            Self::Event(record) => record.item_uuid,
            Self::Objective(record) => record.item_uuid,
            Self::Goal(record) => record.item_uuid,
        }
    }

    /// Progress status for record types that track one.
    pub fn status(&self) -> Option<ProgressStatus> {
        match self {
            Self::Event(record) => Some(record.status),
            Self::Objective(record) => Some(record.status),
            Self::Goal(record) => Some(record.status),
            _ => None,
        }
    }
}
