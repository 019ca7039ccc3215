//! Location repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `locations` storage.
//! - Keep the visitation-order cascade and delete reassignment inside one
//!   transaction each.
//! - Own the lazily created "Unknown Location" sentinel row.
//!
//! # Invariants
//! - Write paths call `Location::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - The sentinel's reserved order can neither be changed nor taken by a
//!   user location through `update_location`.
//! - Location listing is deterministic:
//!   `visitation_order ASC, name COLLATE NOCASE ASC, uuid ASC`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::location::{
    Location, LocationColor, LocationId, LocationSummary, UNKNOWN_LOCATION_VISITATION_ORDER,
};
use crate::model::shopping_item::ShoppingItemId;
use crate::model::validation::ValidationError;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LOCATION_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    visitation_order,
    red,
    green,
    blue,
    opacity
FROM locations";

const LOCATION_ORDER_SQL: &str = "ORDER BY visitation_order ASC, name COLLATE NOCASE ASC, uuid ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by location and item persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    LocationNotFound(LocationId),
    ItemNotFound(ShoppingItemId),
    /// The sentinel location cannot be deleted.
    ProtectedLocation(LocationId),
    /// The update would move the reserved sentinel order onto or off this row.
    ReservedVisitationOrder(LocationId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::ItemNotFound(id) => write!(f, "shopping item not found: {id}"),
            Self::ProtectedLocation(id) => {
                write!(f, "the unknown location cannot be deleted: {id}")
            }
            Self::ReservedVisitationOrder(id) => write!(
                f,
                "visitation order {UNKNOWN_LOCATION_VISITATION_ORDER} is reserved for the unknown location: {id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
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

/// Repository interface for location operations.
pub trait LocationRepository {
    /// Inserts one location and returns the stored record.
    fn create_location(&self, location: &Location) -> RepoResult<Location>;
    /// Replaces all fields and cascades `visitation_order` to the location's
    /// items. Returns the number of items resynchronized.
    ///
    /// The sentinel keeps its reserved order and no user location may take
    /// it; both cases fail with `RepoError::ReservedVisitationOrder`.
    fn update_location(&self, location: &Location) -> RepoResult<usize>;
    /// Reassigns all items to the sentinel, then deletes the location.
    /// Returns the number of reassigned items.
    fn delete_location(&self, id: LocationId) -> RepoResult<usize>;
    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>>;
    /// Case-insensitive exact name lookup.
    fn find_location_by_name(&self, name: &str) -> RepoResult<Option<Location>>;
    fn list_locations(&self) -> RepoResult<Vec<Location>>;
    fn list_location_summaries(&self) -> RepoResult<Vec<LocationSummary>>;
    /// Returns the sentinel, inserting it first when absent.
    fn ensure_unknown_location(&self) -> RepoResult<Location>;
}

/// SQLite-backed location repository.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocationRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn create_location(&self, location: &Location) -> RepoResult<Location> {
        insert_location(self.conn, location)?;
        load_required_location(self.conn, location.uuid)
    }

    fn update_location(&self, location: &Location) -> RepoResult<usize> {
        location.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current_order: Option<i32> = tx
            .query_row(
                "SELECT visitation_order FROM locations WHERE uuid = ?1;",
                [location.uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current_order) = current_order else {
            return Err(RepoError::LocationNotFound(location.uuid));
        };
        let was_unknown = current_order == UNKNOWN_LOCATION_VISITATION_ORDER;
        if was_unknown != location.is_unknown() {
            return Err(RepoError::ReservedVisitationOrder(location.uuid));
        }

        let changed = tx.execute(
            "UPDATE locations
             SET
                name = ?2,
                visitation_order = ?3,
                red = ?4,
                green = ?5,
                blue = ?6,
                opacity = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                location.uuid.to_string(),
                location.name.as_str(),
                location.visitation_order,
                location.color.red,
                location.color.green,
                location.color.blue,
                location.color.opacity,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::LocationNotFound(location.uuid));
        }

        let resynced = tx.execute(
            "UPDATE shopping_items
             SET
                visitation_order = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE location_uuid = ?1;",
            params![location.uuid.to_string(), location.visitation_order],
        )?;

        tx.commit()?;
        Ok(resynced)
    }

    fn delete_location(&self, id: LocationId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let order: Option<i32> = tx
            .query_row(
                "SELECT visitation_order FROM locations WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match order {
            None => return Err(RepoError::LocationNotFound(id)),
            Some(UNKNOWN_LOCATION_VISITATION_ORDER) => {
                return Err(RepoError::ProtectedLocation(id))
            }
            Some(_) => {}
        }

        let unknown = ensure_unknown_location_in(&tx)?;
        let reassigned = tx.execute(
            "UPDATE shopping_items
             SET
                location_uuid = ?2,
                visitation_order = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE location_uuid = ?1;",
            params![
                id.to_string(),
                unknown.uuid.to_string(),
                unknown.visitation_order
            ],
        )?;
        tx.execute("DELETE FROM locations WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(reassigned)
    }

    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>> {
        let location = self
            .conn
            .query_row(
                &format!("{LOCATION_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_location_row(row)),
            )
            .optional()?;
        location.transpose()
    }

    fn find_location_by_name(&self, name: &str) -> RepoResult<Option<Location>> {
        find_location_by_name_in(self.conn, name)
    }

    fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOCATION_SELECT_SQL} {LOCATION_ORDER_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut locations = Vec::new();
        while let Some(row) = rows.next()? {
            locations.push(parse_location_row(row)?);
        }
        Ok(locations)
    }

    fn list_location_summaries(&self) -> RepoResult<Vec<LocationSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.uuid AS uuid,
                l.name AS name,
                l.visitation_order AS visitation_order,
                l.red AS red,
                l.green AS green,
                l.blue AS blue,
                l.opacity AS opacity,
                COUNT(i.uuid) AS item_count
             FROM locations l
             LEFT JOIN shopping_items i ON i.location_uuid = l.uuid
             GROUP BY l.uuid
             ORDER BY l.visitation_order ASC, l.name COLLATE NOCASE ASC, l.uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            let item_count: i64 = row.get("item_count")?;
            summaries.push(LocationSummary {
                location: parse_location_row(row)?,
                item_count: u32::try_from(item_count).map_err(|_| {
                    RepoError::InvalidData(format!("invalid item count `{item_count}`"))
                })?,
            });
        }
        Ok(summaries)
    }

    fn ensure_unknown_location(&self) -> RepoResult<Location> {
        ensure_unknown_location_in(self.conn)
    }
}

/// Inserts a validated location row.
pub(crate) fn insert_location(conn: &Connection, location: &Location) -> RepoResult<()> {
    location.validate()?;
    conn.execute(
        "INSERT INTO locations (
            uuid,
            name,
            visitation_order,
            red,
            green,
            blue,
            opacity
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            location.uuid.to_string(),
            location.name.as_str(),
            location.visitation_order,
            location.color.red,
            location.color.green,
            location.color.blue,
            location.color.opacity,
        ],
    )?;
    Ok(())
}

/// Returns the sentinel row, inserting it when absent.
///
/// The partial unique index on the reserved order makes the insert a no-op
/// once a sentinel exists, so repeated calls return the same identity.
pub(crate) fn ensure_unknown_location_in(conn: &Connection) -> RepoResult<Location> {
    let candidate = Location::unknown();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO locations (
            uuid,
            name,
            visitation_order,
            red,
            green,
            blue,
            opacity
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            candidate.uuid.to_string(),
            candidate.name.as_str(),
            candidate.visitation_order,
            candidate.color.red,
            candidate.color.green,
            candidate.color.blue,
            candidate.color.opacity,
        ],
    )?;
    if inserted == 1 {
        info!(
            "event=unknown_location_created module=repo status=ok location_id={}",
            candidate.uuid
        );
    }

    let location = conn
        .query_row(
            &format!("{LOCATION_SELECT_SQL} WHERE visitation_order = ?1;"),
            [UNKNOWN_LOCATION_VISITATION_ORDER],
            |row| Ok(parse_location_row(row)),
        )
        .optional()?;
    location
        .transpose()?
        .ok_or_else(|| RepoError::InvalidData("unknown location missing after insert".to_string()))
}

pub(crate) fn find_location_by_name_in(
    conn: &Connection,
    name: &str,
) -> RepoResult<Option<Location>> {
    let location = conn
        .query_row(
            &format!(
                "{LOCATION_SELECT_SQL}
                 WHERE name = ?1 COLLATE NOCASE
                 {LOCATION_ORDER_SQL}
                 LIMIT 1;"
            ),
            [name.trim()],
            |row| Ok(parse_location_row(row)),
        )
        .optional()?;
    location.transpose()
}

fn load_required_location(conn: &Connection, id: LocationId) -> RepoResult<Location> {
    let location = conn
        .query_row(
            &format!("{LOCATION_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            |row| Ok(parse_location_row(row)),
        )
        .optional()?;
    location
        .transpose()?
        .ok_or(RepoError::LocationNotFound(id))
}

fn parse_location_row(row: &Row<'_>) -> RepoResult<Location> {
    let uuid_text: String = row.get("uuid")?;
    let location = Location {
        uuid: parse_uuid(&uuid_text, "locations.uuid")?,
        name: row.get("name")?,
        visitation_order: row.get("visitation_order")?,
        color: LocationColor {
            red: row.get("red")?,
            green: row.get("green")?,
            blue: row.get("blue")?,
            opacity: row.get("opacity")?,
        },
    };
    location
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("location {uuid_text}: {err}")))?;
    Ok(location)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Rejects connections that did not go through `open_db*` migrations.
pub(crate) fn ensure_store_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
