//! Dispatch payload sum types.
//!
//! # Responsibility
//! - Define one create payload and one update payload per item type.
//! - Make "one item, one specialized record" structurally enforced: a
//!   specialized record can only be created through a `CreatePayload`,
//!   which always produces the envelope in the same operation.
//!
//! # Invariants
//! - `CreatePayload` carries every required type-specific field; optional
//!   fields fall back to documented defaults.
//! - `UpdatePayload` fields are all optional: absent fields keep their
//!   previous values (patch semantics, not replace).

use crate::model::item::{ItemState, ItemType};
use crate::model::record::{CalendarId, NoteKindId, ObjectiveId, ProgressStatus};
use serde::{Deserialize, Serialize};

/// Default alarm volume intensity when the payload omits one.
pub const DEFAULT_ALARM_VOLUME: i64 = 5;
/// Default calendar display color when the payload omits one.
pub const DEFAULT_CALENDAR_COLOR: &str = "#FFFFFF";
/// Default goal category when the payload omits one.
pub const DEFAULT_GOAL_CATEGORY: &str = "preparation";

/// Envelope fields shared by every create payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeFields {
    /// Display order. Defaults to 0.
    pub position: Option<i64>,
    /// Opaque per-type configuration blob.
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCreate {
    pub name: String,
    pub kind_id: NoteKindId,
    pub content: Option<serde_json::Value>,
    pub info: Option<String>,
    pub noted_at: Option<i64>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmCreate {
    pub name: String,
    pub trigger_at: i64,
    pub expires_at: Option<i64>,
    /// Defaults to [`DEFAULT_ALARM_VOLUME`] when absent.
    pub volume: Option<i64>,
    pub location: Option<String>,
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCreate {
    pub name: String,
    /// Defaults to [`DEFAULT_CALENDAR_COLOR`] when absent.
    pub color: Option<String>,
    pub info: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreate {
    pub name: String,
    pub calendar_id: CalendarId,
    pub status: Option<ProgressStatus>,
    pub due_at: Option<i64>,
    pub info: Option<String>,
    pub gps: Option<String>,
    pub weather: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveCreate {
    pub name: String,
    pub status: Option<ProgressStatus>,
    pub category: Option<String>,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalCreate {
    pub name: String,
    /// Parent objective specialized id.
    pub objective_id: ObjectiveId,
    pub status: Option<ProgressStatus>,
    /// Defaults to [`DEFAULT_GOAL_CATEGORY`] when absent.
    pub category: Option<String>,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopeFields,
}

/// Payload for `ItemDispatcher::create`, one variant per supported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreatePayload {
    Note(NoteCreate),
    Alarm(AlarmCreate),
    Calendar(CalendarCreate),
    Event(EventCreate),
    Objective(ObjectiveCreate),
    Goal(GoalCreate),
}

impl CreatePayload {
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

    /// Name field used to derive the envelope description.
    pub fn name(&self) -> &str {
        match self {
            Self::Note(payload) => &payload.name,
            Self::Alarm(payload) => &payload.name,
            Self::Calendar(payload) => &payload.name,
            Self::Event(payload) => &payload.name,
            Self::Objective(payload) => &payload.name,
            Self::Goal(payload) => &payload.name,
        }
    }

    pub fn envelope(&self) -> &EnvelopeFields {
        match self {
            Self::Note(payload) => &payload.envelope,
            Self::Alarm(payload) => &payload.envelope,
            Self::Calendar(payload) => &payload.envelope,
            Self::Event(payload) => &payload.envelope,
            Self::Objective(payload) => &payload.envelope,
            Self::Goal(payload) => &payload.envelope,
        }
    }
}

/// Envelope fields a non-goal update may patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopePatch {
    pub state: Option<ItemState>,
    pub position: Option<i64>,
    pub config: Option<serde_json::Value>,
}

impl EnvelopePatch {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.position.is_none() && self.config.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    pub name: Option<String>,
    pub content: Option<serde_json::Value>,
    pub info: Option<String>,
    pub noted_at: Option<i64>,
    #[serde(default)]
    pub envelope: EnvelopePatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPatch {
    pub name: Option<String>,
    pub trigger_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub volume: Option<i64>,
    pub location: Option<String>,
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub envelope: EnvelopePatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub info: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopePatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub calendar_id: Option<CalendarId>,
    pub status: Option<ProgressStatus>,
    pub due_at: Option<i64>,
    pub info: Option<String>,
    pub gps: Option<String>,
    pub weather: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopePatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectivePatch {
    pub name: Option<String>,
    pub status: Option<ProgressStatus>,
    pub category: Option<String>,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
    #[serde(default)]
    pub envelope: EnvelopePatch,
}

/// Goal updates never touch the envelope, so no `EnvelopePatch` here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub objective_id: Option<ObjectiveId>,
    pub status: Option<ProgressStatus>,
    pub category: Option<String>,
    pub starts_on: Option<i64>,
    pub due_on: Option<i64>,
    pub info: Option<String>,
}

/// Payload for `ItemDispatcher::update`. Absent fields keep previous
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdatePayload {
    Note(NotePatch),
    Alarm(AlarmPatch),
    Calendar(CalendarPatch),
    Event(EventPatch),
    Objective(ObjectivePatch),
    Goal(GoalPatch),
}

impl UpdatePayload {
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

    /// Envelope fields this update may patch. `None` for goals, whose
    /// updates leave the envelope untouched.
    pub fn envelope(&self) -> Option<&EnvelopePatch> {
        match self {
            Self::Note(payload) => Some(&payload.envelope),
            Self::Alarm(payload) => Some(&payload.envelope),
            Self::Calendar(payload) => Some(&payload.envelope),
            Self::Event(payload) => Some(&payload.envelope),
            Self::Objective(payload) => Some(&payload.envelope),
            Self::Goal(_) => None,
        }
    }

    /// New envelope description when the payload carries a name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Note(payload) => payload.name.as_deref(),
            Self::Alarm(payload) => payload.name.as_deref(),
            Self::Calendar(payload) => payload.name.as_deref(),
            Self::Event(payload) => payload.name.as_deref(),
            Self::Objective(payload) => payload.name.as_deref(),
            Self::Goal(payload) => payload.name.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlarmCreate, CreatePayload, EnvelopeFields, UpdatePayload};
    use crate::model::item::ItemType;

    #[test]
    fn create_payload_reports_type_and_name() {
        let payload = CreatePayload::Alarm(AlarmCreate {
            name: "wake up".to_string(),
            trigger_at: 1_700_000_000_000,
            expires_at: None,
            volume: None,
            location: None,
            settings: None,
            envelope: EnvelopeFields::default(),
        });
        assert_eq!(payload.item_type(), ItemType::Alarm);
        assert_eq!(payload.name(), "wake up");
    }

    #[test]
    fn empty_patch_has_no_name() {
        let payload = UpdatePayload::Note(Default::default());
        assert_eq!(payload.item_type(), ItemType::Note);
        assert!(payload.name().is_none());
    }
}
