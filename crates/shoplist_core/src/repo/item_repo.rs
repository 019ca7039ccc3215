//! Shopping item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and list projections over `shopping_items`.
//! - Copy the owning location's `visitation_order` on every write that sets
//!   or changes `location_uuid`.
//!
//! # Invariants
//! - Write paths call `ShoppingItem::validate()` before SQL mutations.
//! - Caller-provided `visitation_order` values are ignored on write.
//! - List ordering is deterministic and always ends with `uuid ASC`.

use crate::model::location::LocationId;
use crate::model::shopping_item::{ShoppingItem, ShoppingItemId};
use crate::repo::location_repo::{
    ensure_store_ready, ensure_unknown_location_in, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    quantity,
    on_list,
    visitation_order,
    location_uuid
FROM shopping_items";

/// Sort key for item projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemOrder {
    /// `name COLLATE NOCASE ASC`.
    #[default]
    Name,
    /// Shopping route: `visitation_order ASC`, then name.
    VisitationOrder,
}

/// Query options for listing items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    /// `Some(true)` = shopping list, `Some(false)` = purchased, `None` = both.
    pub on_list: Option<bool>,
    /// Restrict to one location's item set.
    pub location_uuid: Option<LocationId>,
    pub order: ItemOrder,
}

/// Repository interface for shopping item operations.
pub trait ShoppingItemRepository {
    /// Inserts one item at its location and returns the stored record.
    fn create_item(&self, item: &ShoppingItem) -> RepoResult<ShoppingItem>;
    /// Replaces all editable fields; resynchronizes the visitation order.
    fn update_item(&self, item: &ShoppingItem) -> RepoResult<ShoppingItem>;
    /// Moves one item between the shopping list and purchased partitions.
    fn set_on_list(&self, id: ShoppingItemId, on_list: bool) -> RepoResult<ShoppingItem>;
    fn delete_item(&self, id: ShoppingItemId) -> RepoResult<()>;
    fn get_item(&self, id: ShoppingItemId) -> RepoResult<Option<ShoppingItem>>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<ShoppingItem>>;
    /// Returns the sentinel location id, creating the sentinel when absent.
    fn unknown_location_id(&self) -> RepoResult<LocationId>;
}

/// SQLite-backed shopping item repository.
pub struct SqliteShoppingItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShoppingItemRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ShoppingItemRepository for SqliteShoppingItemRepository<'_> {
    fn create_item(&self, item: &ShoppingItem) -> RepoResult<ShoppingItem> {
        insert_item(self.conn, item)?;
        load_required_item(self.conn, item.uuid)
    }

    fn update_item(&self, item: &ShoppingItem) -> RepoResult<ShoppingItem> {
        item.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let location_order: Option<i32> = tx
            .query_row(
                "SELECT visitation_order FROM locations WHERE uuid = ?1;",
                [item.location_uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(location_order) = location_order else {
            return Err(RepoError::LocationNotFound(item.location_uuid));
        };

        let changed = tx.execute(
            "UPDATE shopping_items
             SET
                name = ?2,
                quantity = ?3,
                on_list = ?4,
                location_uuid = ?5,
                visitation_order = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                item.uuid.to_string(),
                item.name.as_str(),
                item.quantity,
                bool_to_int(item.on_list),
                item.location_uuid.to_string(),
                location_order,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(item.uuid));
        }

        let stored = load_required_item(&tx, item.uuid)?;
        tx.commit()?;
        Ok(stored)
    }

    fn set_on_list(&self, id: ShoppingItemId, on_list: bool) -> RepoResult<ShoppingItem> {
        let changed = self.conn.execute(
            "UPDATE shopping_items
             SET
                on_list = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), bool_to_int(on_list)],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }
        load_required_item(self.conn, id)
    }

    fn delete_item(&self, id: ShoppingItemId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM shopping_items WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }
        Ok(())
    }

    fn get_item(&self, id: ShoppingItemId) -> RepoResult<Option<ShoppingItem>> {
        get_item_in(self.conn, id)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<ShoppingItem>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(on_list) = query.on_list {
            sql.push_str(" AND on_list = ?");
            bind_values.push(Value::Integer(bool_to_int(on_list)));
        }

        if let Some(location_uuid) = query.location_uuid {
            sql.push_str(" AND location_uuid = ?");
            bind_values.push(Value::Text(location_uuid.to_string()));
        }

        match query.order {
            ItemOrder::Name => sql.push_str(" ORDER BY name COLLATE NOCASE ASC, uuid ASC"),
            ItemOrder::VisitationOrder => sql.push_str(
                " ORDER BY visitation_order ASC, name COLLATE NOCASE ASC, uuid ASC",
            ),
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn unknown_location_id(&self) -> RepoResult<LocationId> {
        Ok(ensure_unknown_location_in(self.conn)?.uuid)
    }
}

/// Inserts a validated item, copying the location's visitation order in the
/// same statement.
pub(crate) fn insert_item(conn: &Connection, item: &ShoppingItem) -> RepoResult<()> {
    item.validate()?;
    let inserted = conn.execute(
        "INSERT INTO shopping_items (
            uuid,
            name,
            quantity,
            on_list,
            visitation_order,
            location_uuid
        )
        SELECT ?1, ?2, ?3, ?4, visitation_order, uuid
        FROM locations
        WHERE uuid = ?5;",
        params![
            item.uuid.to_string(),
            item.name.as_str(),
            item.quantity,
            bool_to_int(item.on_list),
            item.location_uuid.to_string(),
        ],
    )?;
    if inserted == 0 {
        return Err(RepoError::LocationNotFound(item.location_uuid));
    }
    Ok(())
}

fn get_item_in(conn: &Connection, id: ShoppingItemId) -> RepoResult<Option<ShoppingItem>> {
    let item = conn
        .query_row(
            &format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            |row| Ok(parse_item_row(row)),
        )
        .optional()?;
    item.transpose()
}

fn load_required_item(conn: &Connection, id: ShoppingItemId) -> RepoResult<ShoppingItem> {
    get_item_in(conn, id)?.ok_or(RepoError::ItemNotFound(id))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<ShoppingItem> {
    let uuid_text: String = row.get("uuid")?;
    let location_text: String = row.get("location_uuid")?;

    let on_list = match row.get::<_, i64>("on_list")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid on_list value `{other}` in shopping_items.on_list"
            )));
        }
    };

    let item = ShoppingItem {
        uuid: parse_uuid(&uuid_text, "shopping_items.uuid")?,
        name: row.get("name")?,
        quantity: row.get("quantity")?,
        on_list,
        visitation_order: row.get("visitation_order")?,
        location_uuid: parse_uuid(&location_text, "shopping_items.location_uuid")?,
    };
    item.validate()
        .map_err(|err| RepoError::InvalidData(format!("shopping item {uuid_text}: {err}")))?;
    Ok(item)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
