//! Item envelope repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the canonical `items` envelope table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Soft-deleted rows are invisible unless `include_deleted` is set.

use crate::model::item::{AccountId, Item, ItemId, ItemState, ItemType, UserId};
use crate::repo::{bool_to_int, json_to_text, now_ms, parse_json, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    account_id,
    type,
    description,
    state,
    position,
    config,
    deleted_at,
    created_at,
    updated_at
FROM items";

/// Query options for listing an account's items.
#[derive(Debug, Clone, Default)]
pub struct ItemListQuery {
    pub item_type: Option<ItemType>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for item envelope operations.
pub trait ItemRepository {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId>;
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    fn get_item(&self, id: ItemId, include_deleted: bool) -> RepoResult<Option<Item>>;
    fn list_for_account(&self, account_id: AccountId, query: &ItemListQuery)
        -> RepoResult<Vec<Item>>;
    fn soft_delete_item(&self, id: ItemId) -> RepoResult<()>;
    /// Bulk reorder: each pair sets one item's display position.
    fn set_positions(&self, account_id: AccountId, positions: &[(ItemId, i64)]) -> RepoResult<()>;
}

/// SQLite-backed item envelope repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Resolves the user that owns an account, for gamification keying.
    pub fn account_user(&self, account_id: AccountId) -> RepoResult<Option<UserId>> {
        let user_id = self
            .conn
            .query_row(
                "SELECT user_id FROM accounts WHERE id = ?1;",
                [account_id],
                |row| row.get::<_, UserId>(0),
            )
            .optional()?;
        Ok(user_id)
    }

    /// Creates an account row for a user, returning its id. Idempotent per
    /// user.
    pub fn ensure_account(&self, user_id: UserId) -> RepoResult<AccountId> {
        self.conn.execute(
            "INSERT OR IGNORE INTO accounts (user_id) VALUES (?1);",
            [user_id],
        )?;
        let account_id = self.conn.query_row(
            "SELECT id FROM accounts WHERE user_id = ?1;",
            [user_id],
            |row| row.get::<_, AccountId>(0),
        )?;
        Ok(account_id)
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        self.conn.execute(
            "INSERT INTO items (uuid, account_id, type, description, state, position, config)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.uuid.to_string(),
                item.account_id,
                item.item_type.as_tag(),
                item.description.as_str(),
                item.state.as_db(),
                item.position,
                json_to_text(&item.config),
            ],
        )?;
        Ok(item.uuid)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                type = ?1,
                description = ?2,
                state = ?3,
                position = ?4,
                config = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6
               AND deleted_at IS NULL;",
            params![
                item.item_type.as_tag(),
                item.description.as_str(),
                item.state.as_db(),
                item.position,
                json_to_text(&item.config),
                item.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ItemNotFound(item.uuid));
        }
        Ok(())
    }

    fn get_item(&self, id: ItemId, include_deleted: bool) -> RepoResult<Option<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn list_for_account(
        &self,
        account_id: AccountId,
        query: &ItemListQuery,
    ) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE account_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(account_id)];

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        if let Some(item_type) = query.item_type {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(item_type.as_tag().to_string()));
        }

        sql.push_str(" ORDER BY position ASC, created_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn soft_delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                deleted_at = ?1,
                updated_at = ?1
             WHERE uuid = ?2
               AND deleted_at IS NULL;",
            params![now_ms(), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }
        Ok(())
    }

    fn set_positions(&self, account_id: AccountId, positions: &[(ItemId, i64)]) -> RepoResult<()> {
        for (item_id, position) in positions {
            self.conn.execute(
                "UPDATE items
                 SET position = ?1, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?2
                   AND account_id = ?3
                   AND deleted_at IS NULL;",
                params![position, item_id.to_string(), account_id],
            )?;
        }
        Ok(())
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "items.uuid")?;

    let type_text: String = row.get("type")?;
    let item_type = ItemType::parse_tag(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item type `{type_text}` in items.type"))
    })?;

    let state_text: String = row.get("state")?;
    let state = ItemState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item state `{state_text}` in items.state"))
    })?;

    Ok(Item {
        uuid,
        account_id: row.get("account_id")?,
        item_type,
        description: row.get("description")?,
        state,
        position: row.get("position")?,
        config: parse_json(row.get("config")?, "items.config")?,
        deleted_at: row.get("deleted_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
