//! Polymorphic item dispatch surface.
//!
//! # Responsibility
//! - Provide the single create/update/delete/load/list entry point over
//!   every item type, routing type-specific work through the registry.
//! - Commit envelope and specialized record changes in one transaction,
//!   then emit lifecycle events to registered observers.
//!
//! # Invariants
//! - An envelope is never persisted without its specialized record and
//!   vice versa.
//! - Goal updates skip the envelope and return the goal record alone.
//! - Observer failures are logged and never fail the operation.

use crate::model::item::{AccountId, Item, ItemId};
use crate::model::payload::{CreatePayload, UpdatePayload};
use crate::model::record::{GoalRecord, SpecializedRecord};
use crate::repo::item_repo::{ItemListQuery, ItemRepository, SqliteItemRepository};
use crate::repo::RepoError;
use crate::service::handlers::{DispatchCtx, HandlerRegistry};
use crate::service::observers::{GamificationObserver, LifecycleEvent, LifecycleObserver};
use crate::service::{DispatchError, DispatchResult};
use log::{info, warn};
use rusqlite::Connection;

/// Result of a successful create: envelope plus specialized record.
#[derive(Debug, Clone)]
pub struct CreatedItem {
    pub item: Item,
    pub record: SpecializedRecord,
}

/// Fully resolved item: envelope plus specialized record.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: Item,
    pub record: SpecializedRecord,
}

/// Result of a successful update.
///
/// Goal updates deliberately skip the envelope and surface only the
/// patched goal record; every other type returns both halves.
#[derive(Debug, Clone)]
pub enum Updated {
    Item {
        item: Item,
        record: SpecializedRecord,
    },
    Goal(GoalRecord),
}

/// Single entry point for polymorphic item operations.
pub struct ItemDispatcher {
    registry: HandlerRegistry,
    observers: Vec<Box<dyn LifecycleObserver>>,
}

impl Default for ItemDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemDispatcher {
    /// Full production wiring: every type handler plus the gamification
    /// observer.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::default(),
            observers: vec![Box::new(GamificationObserver::default())],
        }
    }

    /// Every type handler, no observers. Lifecycle side effects are the
    /// caller's problem.
    pub fn bare() -> Self {
        Self {
            registry: HandlerRegistry::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_parts(registry: HandlerRegistry, observers: Vec<Box<dyn LifecycleObserver>>) -> Self {
        Self {
            registry,
            observers,
        }
    }

    /// Creates an envelope and its specialized record atomically.
    ///
    /// The owning account must exist; its user is resolved up front for
    /// premium gating and observer keying.
    pub fn create(
        &self,
        conn: &mut Connection,
        account_id: AccountId,
        payload: &CreatePayload,
    ) -> DispatchResult<CreatedItem> {
        let handler = self.registry.get(payload.item_type())?;
        let user_id = SqliteItemRepository::new(conn)
            .account_user(account_id)?
            .ok_or(DispatchError::Repo(RepoError::AccountNotFound(account_id)))?;
        let ctx = DispatchCtx {
            user_id: Some(user_id),
        };

        let tx = conn.transaction()?;
        let (item, record) = {
            let repo = SqliteItemRepository::new(&tx);
            let mut item = Item::new(account_id, payload.item_type(), payload.name());
            let envelope = payload.envelope();
            item.position = envelope.position.unwrap_or(0);
            item.config = envelope.config.clone();

            repo.create_item(&item)?;
            // Re-read for storage-stamped timestamps.
            let item = repo
                .get_item(item.uuid, false)?
                .ok_or(DispatchError::NotFound(item.uuid))?;
            let record = handler.create(&tx, &ctx, &item, payload)?;
            (item, record)
        };
        tx.commit()?;

        info!(
            "event=item_created module=dispatch type={} uuid={} account_id={account_id}",
            item.item_type, item.uuid
        );
        self.notify(conn, &LifecycleEvent::Created {
            item: &item,
            record: &record,
        });
        Ok(CreatedItem { item, record })
    }

    /// Applies a partial update to an item's specialized record, and for
    /// non-goal types mirrors a payload name onto the envelope.
    pub fn update(
        &self,
        conn: &mut Connection,
        item_uuid: ItemId,
        payload: &UpdatePayload,
    ) -> DispatchResult<Updated> {
        let tx = conn.transaction()?;
        let (item, before, after, result) = {
            let repo = SqliteItemRepository::new(&tx);
            let mut item = repo
                .get_item(item_uuid, false)?
                .ok_or(DispatchError::NotFound(item_uuid))?;
            if payload.item_type() != item.item_type {
                return Err(DispatchError::Validation(format!(
                    "expected a {} payload for item {item_uuid}, got {}",
                    item.item_type,
                    payload.item_type()
                )));
            }

            let handler = self.registry.get(item.item_type)?;
            let before = handler.load(&tx, item_uuid)?;
            handler.apply_patch(&tx, item_uuid, payload)?;
            let after = handler.load(&tx, item_uuid)?;

            let result = if let SpecializedRecord::Goal(goal) = &after {
                // Goal updates leave the envelope untouched.
                Updated::Goal(goal.clone())
            } else {
                let envelope = payload.envelope().filter(|patch| !patch.is_empty());
                if payload.name().is_none() && envelope.is_none() {
                    // Record-only patch: the envelope row stays as it is.
                    Updated::Item {
                        item: item.clone(),
                        record: after.clone(),
                    }
                } else {
                    if let Some(name) = payload.name() {
                        item.description = name.to_string();
                    }
                    if let Some(envelope) = envelope {
                        if let Some(state) = envelope.state {
                            item.state = state;
                        }
                        if let Some(position) = envelope.position {
                            item.position = position;
                        }
                        if let Some(config) = &envelope.config {
                            item.config = Some(config.clone());
                        }
                    }
                    repo.update_item(&item)?;
                    let item = repo
                        .get_item(item_uuid, false)?
                        .ok_or(DispatchError::NotFound(item_uuid))?;
                    Updated::Item {
                        item,
                        record: after.clone(),
                    }
                }
            };
            (item, before, after, result)
        };
        tx.commit()?;

        info!(
            "event=item_updated module=dispatch type={} uuid={item_uuid}",
            item.item_type
        );
        self.notify(conn, &LifecycleEvent::Updated {
            item: &item,
            before: &before,
            after: &after,
        });
        Ok(result)
    }

    /// Soft-deletes an item and its specialized record, cascading where
    /// the type requires it.
    pub fn delete(&self, conn: &mut Connection, item_uuid: ItemId) -> DispatchResult<()> {
        let tx = conn.transaction()?;
        let item = {
            let repo = SqliteItemRepository::new(&tx);
            let item = repo
                .get_item(item_uuid, false)?
                .ok_or(DispatchError::NotFound(item_uuid))?;
            let handler = self.registry.get(item.item_type)?;
            handler.delete(&tx, item_uuid)?;
            repo.soft_delete_item(item_uuid)?;
            item
        };
        tx.commit()?;

        info!(
            "event=item_deleted module=dispatch type={} uuid={item_uuid}",
            item.item_type
        );
        self.notify(conn, &LifecycleEvent::Deleted { item: &item });
        Ok(())
    }

    /// Loads a live item with its specialized record.
    pub fn load(&self, conn: &Connection, item_uuid: ItemId) -> DispatchResult<ItemView> {
        let repo = SqliteItemRepository::new(conn);
        let item = repo
            .get_item(item_uuid, false)?
            .ok_or(DispatchError::NotFound(item_uuid))?;
        let handler = self.registry.get(item.item_type)?;
        let record = handler.load(conn, item_uuid)?;
        Ok(ItemView { item, record })
    }

    /// Lists envelopes for an account, honoring type filter and paging.
    pub fn list(
        &self,
        conn: &Connection,
        account_id: AccountId,
        query: &ItemListQuery,
    ) -> DispatchResult<Vec<Item>> {
        Ok(SqliteItemRepository::new(conn).list_for_account(account_id, query)?)
    }

    /// Bulk position update for an account's items.
    pub fn reorder(
        &self,
        conn: &Connection,
        account_id: AccountId,
        positions: &[(ItemId, i64)],
    ) -> DispatchResult<()> {
        Ok(SqliteItemRepository::new(conn).set_positions(account_id, positions)?)
    }

    /// Runs observers after a committed operation. The owning user is
    /// resolved from the item's account; a missing owner skips observers
    /// with a warning instead of failing the already-committed operation.
    fn notify(&self, conn: &Connection, event: &LifecycleEvent<'_>) {
        let item = event.item();
        let user_id = match SqliteItemRepository::new(conn).account_user(item.account_id) {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                warn!(
                    "event=observer_skipped module=dispatch uuid={} account_id={} \
                     status=missing_owner",
                    item.uuid, item.account_id
                );
                return;
            }
            Err(err) => {
                warn!(
                    "event=observer_skipped module=dispatch uuid={} error=\"{err}\"",
                    item.uuid
                );
                return;
            }
        };
        for observer in &self.observers {
            if let Err(err) = observer.on_event(conn, user_id, event) {
                warn!(
                    "event=observer_failed module=dispatch observer={} uuid={} error=\"{err}\"",
                    observer.name(),
                    item.uuid
                );
            }
        }
    }
}
