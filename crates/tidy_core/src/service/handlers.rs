//! Per-type dispatch handlers and the handler registry.
//!
//! # Responsibility
//! - Implement create/load/patch/delete for each specialized record type
//!   behind one `TypeHandler` contract.
//! - Enforce per-type validation: parent references, note kind premium
//!   gating, payload defaults.
//!
//! # Invariants
//! - A handler only ever touches its own specialized table, except the
//!   objective handler's cascade over dependent goals.
//! - Defaults are applied at create time; patches never re-apply them.

use crate::model::item::{Item, ItemId, ItemType, UserId};
use crate::model::payload::{
    CreatePayload, UpdatePayload, DEFAULT_ALARM_VOLUME, DEFAULT_CALENDAR_COLOR,
    DEFAULT_GOAL_CATEGORY,
};
use crate::model::record::{
    AlarmRecord, CalendarRecord, EventRecord, GoalRecord, NoteRecord, ObjectiveRecord,
    ProgressStatus, SpecializedRecord,
};
use crate::repo::gamification_repo::LevelStore;
use crate::repo::record_repo::{
    new_record_id, AlarmStore, CalendarStore, EventStore, GoalStore, NoteKindStore, NoteStore,
    ObjectiveStore,
};
use crate::repo::{now_ms, RepoError};
use crate::service::{DispatchError, DispatchResult};
use log::info;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Caller context threaded through create operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchCtx {
    /// User owning the target account, when resolvable. Absent users are
    /// treated as non-premium.
    pub user_id: Option<UserId>,
}

/// Type-specific behavior behind the polymorphic dispatch surface.
pub trait TypeHandler: Send + Sync {
    fn item_type(&self) -> ItemType;

    /// Creates the specialized record for a freshly inserted envelope.
    fn create(
        &self,
        conn: &Connection,
        ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord>;

    /// Loads the live specialized record for an item.
    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord>;

    /// Applies a partial update; absent fields keep previous values.
    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()>;

    /// Tombstones the specialized record, including dependent cascades.
    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()>;
}

fn payload_mismatch(expected: ItemType, got: ItemType) -> DispatchError {
    DispatchError::Validation(format!("expected a {expected} payload, got {got}"))
}

fn record_missing(item_type: ItemType, item_uuid: ItemId) -> DispatchError {
    DispatchError::Repo(RepoError::RecordNotFound {
        item_type,
        item_uuid,
    })
}

pub struct NoteHandler;

impl TypeHandler for NoteHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Note
    }

    fn create(
        &self,
        conn: &Connection,
        ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Note(note) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };

        let kinds = NoteKindStore::new(conn);
        let kind = kinds.get(note.kind_id)?.ok_or_else(|| {
            DispatchError::Validation(format!("unknown note kind: {}", note.kind_id))
        })?;
        if kind.is_premium && !user_is_premium(conn, ctx.user_id)? {
            return Err(DispatchError::PremiumRequired { kind: kind.name });
        }

        let record = NoteRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            name: note.name.clone(),
            kind_id: note.kind_id,
            content: note.content.clone(),
            info: note.info.clone(),
            noted_at: note.noted_at,
            deleted_at: None,
        };
        NoteStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Note(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        NoteStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Note)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Note(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        NoteStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.content.as_ref(),
            patch.info.as_deref(),
            patch.noted_at,
        )?;
        Ok(())
    }

    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        NoteStore::new(conn).soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

/// Whether the owning user currently holds an unexpired premium flag.
fn user_is_premium(conn: &Connection, user_id: Option<UserId>) -> DispatchResult<bool> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    let ledger = LevelStore::new(conn).get(user_id)?;
    Ok(ledger.is_some_and(|ledger| ledger.is_premium_active(now_ms())))
}

pub struct AlarmHandler;

impl TypeHandler for AlarmHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Alarm
    }

    fn create(
        &self,
        conn: &Connection,
        _ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Alarm(alarm) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        let volume = alarm.volume.unwrap_or(DEFAULT_ALARM_VOLUME);
        if !(0..=10).contains(&volume) {
            return Err(DispatchError::Validation(format!(
                "alarm volume must be between 0 and 10, got {volume}"
            )));
        }

        let record = AlarmRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            name: alarm.name.clone(),
            trigger_at: alarm.trigger_at,
            expires_at: alarm.expires_at,
            volume,
            location: alarm.location.clone(),
            settings: alarm.settings.clone(),
            deleted_at: None,
        };
        AlarmStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Alarm(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        AlarmStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Alarm)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Alarm(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        if let Some(volume) = patch.volume {
            if !(0..=10).contains(&volume) {
                return Err(DispatchError::Validation(format!(
                    "alarm volume must be between 0 and 10, got {volume}"
                )));
            }
        }
        AlarmStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.trigger_at,
            patch.expires_at,
            patch.volume,
            patch.location.as_deref(),
            patch.settings.as_ref(),
        )?;
        Ok(())
    }

    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        AlarmStore::new(conn).soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

pub struct CalendarHandler;

impl TypeHandler for CalendarHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Calendar
    }

    fn create(
        &self,
        conn: &Connection,
        _ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Calendar(calendar) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        let record = CalendarRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            name: calendar.name.clone(),
            color: calendar
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_CALENDAR_COLOR.to_string()),
            info: calendar.info.clone(),
            deleted_at: None,
        };
        CalendarStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Calendar(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        CalendarStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Calendar)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Calendar(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        CalendarStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.color.as_deref(),
            patch.info.as_deref(),
        )?;
        Ok(())
    }

    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        CalendarStore::new(conn).soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

pub struct EventHandler;

impl TypeHandler for EventHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Event
    }

    fn create(
        &self,
        conn: &Connection,
        _ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Event(event) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        if !CalendarStore::new(conn).exists(event.calendar_id)? {
            return Err(DispatchError::Validation(format!(
                "unknown calendar: {}",
                event.calendar_id
            )));
        }

        let record = EventRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            calendar_id: event.calendar_id,
            name: event.name.clone(),
            status: event.status.unwrap_or(ProgressStatus::Pending),
            due_at: event.due_at,
            info: event.info.clone(),
            gps: event.gps.clone(),
            weather: event.weather.clone(),
            deleted_at: None,
        };
        EventStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Event(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        EventStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Event)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Event(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        if let Some(calendar_id) = patch.calendar_id {
            if !CalendarStore::new(conn).exists(calendar_id)? {
                return Err(DispatchError::Validation(format!(
                    "unknown calendar: {calendar_id}"
                )));
            }
        }
        EventStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.calendar_id,
            patch.status,
            patch.due_at,
            patch.info.as_deref(),
            patch.gps.as_deref(),
            patch.weather.as_deref(),
        )?;
        Ok(())
    }

    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        EventStore::new(conn).soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

pub struct ObjectiveHandler;

impl TypeHandler for ObjectiveHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Objective
    }

    fn create(
        &self,
        conn: &Connection,
        _ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Objective(objective) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        let record = ObjectiveRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            name: objective.name.clone(),
            status: objective.status.unwrap_or(ProgressStatus::Pending),
            category: objective.category.clone(),
            starts_on: objective.starts_on,
            due_on: objective.due_on,
            info: objective.info.clone(),
            deleted_at: None,
        };
        ObjectiveStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Objective(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        ObjectiveStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Objective)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Objective(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        ObjectiveStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.status,
            patch.category.as_deref(),
            patch.starts_on,
            patch.due_on,
            patch.info.as_deref(),
        )?;
        Ok(())
    }

    /// Tombstones the objective and every live goal attached to it.
    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        let store = ObjectiveStore::new(conn);
        let Some(record) = store.get_by_item(item_uuid)? else {
            return Ok(());
        };
        let cascaded = GoalStore::new(conn).soft_delete_for_objective(record.id)?;
        if cascaded > 0 {
            info!(
                "event=objective_cascade module=dispatch objective_id={} goals_deleted={cascaded}",
                record.id
            );
        }
        store.soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

pub struct GoalHandler;

impl TypeHandler for GoalHandler {
    fn item_type(&self) -> ItemType {
        ItemType::Goal
    }

    fn create(
        &self,
        conn: &Connection,
        _ctx: &DispatchCtx,
        item: &Item,
        payload: &CreatePayload,
    ) -> DispatchResult<SpecializedRecord> {
        let CreatePayload::Goal(goal) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        if !ObjectiveStore::new(conn).exists(goal.objective_id)? {
            return Err(DispatchError::Validation(format!(
                "unknown objective: {}",
                goal.objective_id
            )));
        }

        let record = GoalRecord {
            id: new_record_id(),
            item_uuid: item.uuid,
            objective_id: goal.objective_id,
            name: goal.name.clone(),
            status: goal.status.unwrap_or(ProgressStatus::Pending),
            category: goal
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_GOAL_CATEGORY.to_string()),
            starts_on: goal.starts_on,
            due_on: goal.due_on,
            info: goal.info.clone(),
            deleted_at: None,
        };
        GoalStore::new(conn).insert(&record)?;
        Ok(SpecializedRecord::Goal(record))
    }

    fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<SpecializedRecord> {
        GoalStore::new(conn)
            .get_by_item(item_uuid)?
            .map(SpecializedRecord::Goal)
            .ok_or_else(|| record_missing(self.item_type(), item_uuid))
    }

    fn apply_patch(
        &self,
        conn: &Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<()> {
        let UpdatePayload::Goal(patch) = payload else {
            return Err(payload_mismatch(self.item_type(), payload.item_type()));
        };
        if let Some(objective_id) = patch.objective_id {
            if !ObjectiveStore::new(conn).exists(objective_id)? {
                return Err(DispatchError::Validation(format!(
                    "unknown objective: {objective_id}"
                )));
            }
        }
        GoalStore::new(conn).patch(
            item_uuid,
            patch.name.as_deref(),
            patch.objective_id,
            patch.status,
            patch.category.as_deref(),
            patch.starts_on,
            patch.due_on,
            patch.info.as_deref(),
        )?;
        Ok(())
    }

    fn delete(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<()> {
        GoalStore::new(conn).soft_delete_by_item(item_uuid)?;
        Ok(())
    }
}

/// Lookup table from type tag to handler.
///
/// The default registry covers every supported type; registering a
/// handler for an existing tag replaces it.
pub struct HandlerRegistry {
    handlers: BTreeMap<ItemType, Box<dyn TypeHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self {
            handlers: BTreeMap::new(),
        };
        registry.register(Box::new(NoteHandler));
        registry.register(Box::new(AlarmHandler));
        registry.register(Box::new(CalendarHandler));
        registry.register(Box::new(EventHandler));
        registry.register(Box::new(ObjectiveHandler));
        registry.register(Box::new(GoalHandler));
        registry
    }
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, handler: Box<dyn TypeHandler>) {
        self.handlers.insert(handler.item_type(), handler);
    }

    pub fn get(&self, item_type: ItemType) -> DispatchResult<&dyn TypeHandler> {
        self.handlers
            .get(&item_type)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| DispatchError::UnsupportedType(item_type.as_tag().to_string()))
    }

    pub fn registered_types(&self) -> Vec<ItemType> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::HandlerRegistry;
    use crate::model::item::ItemType;
    use crate::service::DispatchError;

    #[test]
    fn default_registry_covers_all_types() {
        let registry = HandlerRegistry::default();
        for item_type in ItemType::ALL {
            assert!(registry.get(item_type).is_ok());
        }
        assert_eq!(registry.registered_types().len(), ItemType::ALL.len());
    }

    #[test]
    fn empty_registry_reports_unsupported_type() {
        let registry = HandlerRegistry::empty();
        match registry.get(ItemType::Note).err() {
            Some(DispatchError::UnsupportedType(tag)) => assert_eq!(tag, "note"),
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }
}
