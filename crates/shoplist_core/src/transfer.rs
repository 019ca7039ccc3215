//! JSON snapshot import/export of the full dataset.
//!
//! # Responsibility
//! - Define the field-named document format for locations and items.
//! - Dump the store to `locations.json` + `shoppingItems.json`.
//! - Seed the store from the same pair of documents.
//!
//! # Invariants
//! - Import runs in one transaction; a bad record rolls back everything.
//! - Items reference locations by name (case-insensitive); unresolved names
//!   fall back to the "Unknown Location".
//! - Location names are not unique in the store. When a dump holds two
//!   locations whose names match case-insensitively, import keeps the first
//!   and its items absorb the other's; export logs a warning in that case.
//! - The sentinel record in a document updates the sentinel's name and
//!   color; it never creates a second sentinel.

use crate::model::location::{Location, LocationColor, UNKNOWN_LOCATION_VISITATION_ORDER};
use crate::model::shopping_item::ShoppingItem;
use crate::model::validation::ValidationError;
use crate::repo::item_repo::{
    insert_item, ItemListQuery, ShoppingItemRepository, SqliteShoppingItemRepository,
};
use crate::repo::location_repo::{
    ensure_unknown_location_in, find_location_by_name_in, insert_location, LocationRepository,
    RepoError, SqliteLocationRepository,
};
use log::{info, warn};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File name of the location document inside a dump/seed directory.
pub const LOCATIONS_FILE_NAME: &str = "locations.json";
/// File name of the item document inside a dump/seed directory.
pub const ITEMS_FILE_NAME: &str = "shoppingItems.json";

pub type TransferResult<T> = Result<T, TransferError>;

/// Location document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub name: String,
    pub visitation_order: i32,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub opacity: f64,
}

impl From<&Location> for LocationRecord {
    fn from(value: &Location) -> Self {
        Self {
            name: value.name.clone(),
            visitation_order: value.visitation_order,
            red: value.color.red,
            green: value.color.green,
            blue: value.color.blue,
            opacity: value.color.opacity,
        }
    }
}

impl LocationRecord {
    fn color(&self) -> LocationColor {
        LocationColor::new(self.red, self.green, self.blue, self.opacity)
    }
}

/// Shopping item document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemRecord {
    pub name: String,
    pub quantity: i32,
    pub on_list: bool,
    pub location_name: String,
}

/// Full dataset in document form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub locations: Vec<LocationRecord>,
    pub items: Vec<ShoppingItemRecord>,
}

/// Counters reported by [`import_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub locations_created: usize,
    /// Records skipped because a location with that name already exists.
    pub locations_skipped: usize,
    pub unknown_location_updated: bool,
    pub items_created: usize,
    /// Items whose `locationName` did not resolve.
    pub items_unresolved: usize,
}

/// Transfer-layer error.
#[derive(Debug)]
pub enum TransferError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidRecord {
        kind: &'static str,
        name: String,
        source: ValidationError,
    },
    Repo(RepoError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error on `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "malformed document `{}`: {source}", path.display())
            }
            Self::InvalidRecord { kind, name, source } => {
                write!(f, "invalid {kind} record `{name}`: {source}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidRecord { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for TransferError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Reads every location and item into document form.
///
/// Locations come out in visitation order, items by name.
pub fn export_snapshot(conn: &Connection) -> TransferResult<Snapshot> {
    let locations = SqliteLocationRepository::try_new(conn)?.list_locations()?;
    let items = SqliteShoppingItemRepository::try_new(conn)?.list_items(&ItemListQuery::default())?;

    let names: HashMap<_, _> = locations
        .iter()
        .map(|location| (location.uuid, location.name.as_str()))
        .collect();
    let mut item_records = Vec::with_capacity(items.len());
    for item in &items {
        let location_name = names.get(&item.location_uuid).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "shopping item {} references missing location {}",
                item.uuid, item.location_uuid
            ))
        })?;
        item_records.push(ShoppingItemRecord {
            name: item.name.clone(),
            quantity: item.quantity,
            on_list: item.on_list,
            location_name: (*location_name).to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(locations.len());
    let shared_names = locations
        .iter()
        .filter(|location| !seen.insert(location.name.to_lowercase()))
        .count();
    if shared_names > 0 {
        warn!(
            "event=snapshot_export module=transfer status=degraded shared_location_names={}",
            shared_names
        );
    }

    Ok(Snapshot {
        locations: locations.iter().map(LocationRecord::from).collect(),
        items: item_records,
    })
}

/// Loads a snapshot into the store in one transaction.
pub fn import_snapshot(conn: &Connection, snapshot: &Snapshot) -> TransferResult<ImportSummary> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let unknown = ensure_unknown_location_in(&tx)?;
    let mut summary = ImportSummary::default();

    for record in &snapshot.locations {
        if record.visitation_order == UNKNOWN_LOCATION_VISITATION_ORDER {
            let renamed = Location {
                uuid: unknown.uuid,
                name: record.name.trim().to_string(),
                visitation_order: UNKNOWN_LOCATION_VISITATION_ORDER,
                color: record.color(),
            };
            renamed.validate().map_err(|source| TransferError::InvalidRecord {
                kind: "location",
                name: record.name.clone(),
                source,
            })?;
            tx.execute(
                "UPDATE locations
                 SET
                    name = ?2,
                    red = ?3,
                    green = ?4,
                    blue = ?5,
                    opacity = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    renamed.uuid.to_string(),
                    renamed.name.as_str(),
                    renamed.color.red,
                    renamed.color.green,
                    renamed.color.blue,
                    renamed.color.opacity,
                ],
            )?;
            summary.unknown_location_updated = true;
            continue;
        }

        if find_location_by_name_in(&tx, &record.name)?.is_some() {
            summary.locations_skipped += 1;
            continue;
        }

        let location = Location::new(&record.name, record.visitation_order, record.color())
            .map_err(|source| TransferError::InvalidRecord {
                kind: "location",
                name: record.name.clone(),
                source,
            })?;
        insert_location(&tx, &location)?;
        summary.locations_created += 1;
    }

    for record in &snapshot.items {
        let location_uuid = match find_location_by_name_in(&tx, &record.location_name)? {
            Some(location) => location.uuid,
            None => {
                summary.items_unresolved += 1;
                unknown.uuid
            }
        };
        let item = ShoppingItem::new(&record.name, record.quantity, record.on_list, location_uuid)
            .map_err(|source| TransferError::InvalidRecord {
                kind: "shopping item",
                name: record.name.clone(),
                source,
            })?;
        insert_item(&tx, &item)?;
        summary.items_created += 1;
    }

    tx.commit()?;
    info!(
        "event=snapshot_import module=transfer status=ok locations_created={} locations_skipped={} items_created={} items_unresolved={}",
        summary.locations_created,
        summary.locations_skipped,
        summary.items_created,
        summary.items_unresolved
    );
    Ok(summary)
}

/// Returns whether the store holds nothing but the sentinel.
pub fn is_store_unseeded(conn: &Connection) -> TransferResult<bool> {
    let user_rows: i64 = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM locations WHERE visitation_order != ?1)
            + (SELECT COUNT(*) FROM shopping_items);",
        [UNKNOWN_LOCATION_VISITATION_ORDER],
        |row| row.get(0),
    )?;
    Ok(user_rows == 0)
}

/// Writes both documents into `dir`, creating it when missing.
pub fn write_snapshot_dir(dir: &Path, snapshot: &Snapshot) -> TransferResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| TransferError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_document(&dir.join(LOCATIONS_FILE_NAME), &snapshot.locations)?;
    write_document(&dir.join(ITEMS_FILE_NAME), &snapshot.items)?;
    info!(
        "event=snapshot_dump module=transfer status=ok locations={} items={}",
        snapshot.locations.len(),
        snapshot.items.len()
    );
    Ok(())
}

/// Reads both documents from `dir`. A missing document reads as empty.
pub fn read_snapshot_dir(dir: &Path) -> TransferResult<Snapshot> {
    Ok(Snapshot {
        locations: read_document(&dir.join(LOCATIONS_FILE_NAME))?,
        items: read_document(&dir.join(ITEMS_FILE_NAME))?,
    })
}

fn write_document<T: Serialize>(path: &Path, records: &[T]) -> TransferResult<()> {
    let io_error = |source: std::io::Error| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| TransferError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)?;
    Ok(())
}

fn read_document<T: DeserializeOwned>(path: &Path) -> TransferResult<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TransferError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|source| TransferError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{LocationRecord, ShoppingItemRecord};

    #[test]
    fn records_use_camel_case_field_names() {
        let location = LocationRecord {
            name: "Market".to_string(),
            visitation_order: 10,
            red: 0.1,
            green: 0.2,
            blue: 0.3,
            opacity: 1.0,
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["visitationOrder"], 10);
        assert_eq!(json["opacity"], 1.0);

        let item: ShoppingItemRecord = serde_json::from_value(serde_json::json!({
            "name": "Milk",
            "quantity": 2,
            "onList": true,
            "locationName": "Market"
        }))
        .unwrap();
        assert_eq!(item.location_name, "Market");
        assert!(item.on_list);
    }
}
