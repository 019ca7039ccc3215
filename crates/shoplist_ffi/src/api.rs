//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the three list views and the add/edit/delete flows to Dart via FRB.
//! - Drive item and location edits through the core forms so commit and
//!   deferred-deletion rules match the in-process UI.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures come back as envelopes with `ok=false` and are logged with
//!   `status=error`.
//! - Every successful mutation reports the views the caller must re-fetch.

use log::error;
use rusqlite::Connection;
use shoplist_core::db::open_db;
use shoplist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ItemForm, ItemFormOptions, ItemService, LocationColor, LocationForm, LocationService,
    LocationSummary, Projection, ShoppingItem, SqliteLocationRepository,
    SqliteShoppingItemRepository, StartupConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

static STORE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Shopping item row as rendered by the list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub item_id: String,
    pub name: String,
    pub quantity: i32,
    pub on_list: bool,
    pub location_id: String,
    pub location_name: String,
    pub visitation_order: i32,
}

/// Location row with its "N items" count.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationView {
    pub location_id: String,
    pub name: String,
    pub visitation_order: i32,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub opacity: f64,
    pub item_count: u32,
    /// True for the "Unknown Location"; its order is not user-editable.
    pub is_unknown: bool,
}

/// Item list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemListResponse {
    pub ok: bool,
    pub items: Vec<ItemView>,
    pub message: String,
}

/// Location list envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationListResponse {
    pub ok: bool,
    pub locations: Vec<LocationView>,
    pub message: String,
}

/// Mutation envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected entity ID.
    pub id: Option<String>,
    /// Views to re-fetch: `shopping_list|purchased|locations`.
    pub refresh: Vec<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Uuid, refresh: &[Projection]) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            refresh: refresh.iter().map(|view| projection_label(*view).to_string()).collect(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            refresh: Vec::new(),
            message: message.into(),
        }
    }
}

/// Items still to buy, sorted by name, or in route order when `by_route`.
#[flutter_rust_bridge::frb(sync)]
pub fn shopping_list(by_route: bool) -> ItemListResponse {
    item_list("shopping_list", |service| {
        if by_route {
            service.list_on_list_by_visitation_order()
        } else {
            service.list_on_list()
        }
    })
}

/// Purchased items, sorted by name.
#[flutter_rust_bridge::frb(sync)]
pub fn purchased_list() -> ItemListResponse {
    item_list("purchased_list", |service| service.list_purchased())
}

/// One location's items, sorted by name.
#[flutter_rust_bridge::frb(sync)]
pub fn location_items(location_id: String) -> ItemListResponse {
    let location_uuid = match parse_id("location_id", &location_id) {
        Ok(id) => id,
        Err(err) => return item_list_failure("location_items", err),
    };
    item_list("location_items", |service| {
        service.list_items_at_location(location_uuid)
    })
}

/// Locations in visitation order with item counts; the sentinel comes last.
#[flutter_rust_bridge::frb(sync)]
pub fn locations_list() -> LocationListResponse {
    let result = with_store("locations_list", |conn| {
        let service = location_service(conn)?;
        service.unknown_location().map_err(|err| err.to_string())?;
        service
            .list_location_summaries()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(summaries) => LocationListResponse {
            ok: true,
            message: format!("{} location(s).", summaries.len()),
            locations: summaries.into_iter().map(to_location_view).collect(),
        },
        Err(message) => LocationListResponse {
            ok: false,
            locations: Vec::new(),
            message,
        },
    }
}

/// Adds (`item_id=None`) or edits one item.
///
/// `location_id=None` places the item at the "Unknown Location".
#[flutter_rust_bridge::frb(sync)]
pub fn save_item(
    item_id: Option<String>,
    name: String,
    quantity: i32,
    on_list: bool,
    location_id: Option<String>,
) -> ActionResponse {
    let result = with_store("save_item", |conn| {
        let service = item_service(conn)?;
        let existing = load_item(&service, item_id.as_deref())?;
        let location_uuid = location_id
            .as_deref()
            .map(|raw| parse_id("location_id", raw))
            .transpose()?;

        let mut form = ItemForm::new(ItemFormOptions {
            allows_deletion: true,
            add_to_shopping_list: on_list,
        });
        form.load(existing.as_ref());
        let draft = form.draft_mut();
        draft.name = name;
        draft.quantity = quantity;
        draft.on_list = on_list;
        draft.location_uuid = location_uuid;

        let outcome = form.commit(&service).map_err(|err| err.to_string())?;
        Ok((outcome.record.uuid, outcome.refresh))
    });
    match result {
        Ok((id, refresh)) => ActionResponse::success("Item saved.", id, &refresh),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Moves one item to the shopping list (`true`) or the purchased list.
#[flutter_rust_bridge::frb(sync)]
pub fn set_item_on_list(item_id: String, on_list: bool) -> ActionResponse {
    let result = with_store("set_item_on_list", |conn| {
        let id = parse_id("item_id", &item_id)?;
        item_service(conn)?
            .set_on_list(id, on_list)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(item) => ActionResponse::success(
            "Item moved.",
            item.uuid,
            &[Projection::ShoppingList, Projection::Purchased],
        ),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Deletes one item.
///
/// Confirmation and dismissal both happen inside this call, so the edit view
/// must already be closed: call it from the view's close-completion callback,
/// never while the item is still on screen.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_item(item_id: String) -> ActionResponse {
    let result = with_store("delete_item", |conn| {
        let service = item_service(conn)?;
        let existing = load_item(&service, Some(item_id.as_str()))?;
        let mut form = ItemForm::new(ItemFormOptions::default());
        form.load(existing.as_ref());
        let id = form.request_delete().map_err(|err| err.to_string())?;
        let outcome = form.finish_dismiss(&service).map_err(|err| err.to_string())?;
        Ok((id, outcome.refresh))
    });
    match result {
        Ok((id, refresh)) => ActionResponse::success("Item deleted.", id, &refresh),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Adds (`location_id=None`) or edits one location.
///
/// For the "Unknown Location", `visitation_order` is ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn save_location(
    location_id: Option<String>,
    name: String,
    visitation_order: i32,
    red: f64,
    green: f64,
    blue: f64,
    opacity: f64,
) -> ActionResponse {
    let result = with_store("save_location", |conn| {
        let service = location_service(conn)?;
        let existing = match location_id.as_deref() {
            Some(raw) => {
                let id = parse_id("location_id", raw)?;
                let location = service
                    .get_location(id)
                    .map_err(|err| err.to_string())?
                    .ok_or_else(|| format!("location not found: {id}"))?;
                Some(location)
            }
            None => None,
        };

        let mut form = LocationForm::new();
        form.load(existing.as_ref());
        let draft = form.draft_mut();
        draft.name = name;
        draft.visitation_order = visitation_order;
        draft.color = LocationColor::new(red, green, blue, opacity);

        let outcome = form.commit(&service).map_err(|err| err.to_string())?;
        Ok((outcome.record.uuid, outcome.refresh))
    });
    match result {
        Ok((id, refresh)) => ActionResponse::success("Location saved.", id, &refresh),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Deletes one location; its items move to the "Unknown Location".
///
/// Like `delete_item`, the deferred deletion runs to completion here; call it
/// once the edit view has finished closing.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_location(location_id: String) -> ActionResponse {
    let result = with_store("delete_location", |conn| {
        let id = parse_id("location_id", &location_id)?;
        let service = location_service(conn)?;
        let location = service
            .get_location(id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("location not found: {id}"))?;

        let mut form = LocationForm::new();
        form.load(Some(&location));
        form.request_delete().map_err(|err| err.to_string())?;
        let outcome = form.finish_dismiss(&service).map_err(|err| err.to_string())?;
        Ok((id, outcome.refresh))
    });
    match result {
        Ok((id, refresh)) => ActionResponse::success("Location deleted.", id, &refresh),
        Err(message) => ActionResponse::failure(message),
    }
}

fn item_list(
    op: &'static str,
    f: impl FnOnce(
        &ItemService<SqliteShoppingItemRepository<'_>>,
    ) -> shoplist_core::RepoResult<Vec<ShoppingItem>>,
) -> ItemListResponse {
    let result = with_store(op, |conn| {
        let items = f(&item_service(conn)?).map_err(|err| err.to_string())?;
        let names = location_names(conn)?;
        Ok(items
            .into_iter()
            .map(|item| to_item_view(item, &names))
            .collect::<Vec<_>>())
    });
    match result {
        Ok(items) => ItemListResponse {
            ok: true,
            message: format!("{} item(s).", items.len()),
            items,
        },
        Err(message) => item_list_failure(op, message),
    }
}

fn item_list_failure(op: &str, message: String) -> ItemListResponse {
    ItemListResponse {
        ok: false,
        items: Vec::new(),
        message: format!("{op} failed: {message}"),
    }
}

/// Store path, read once; logging and seed settings do not affect it.
fn resolve_store_path() -> &'static Path {
    STORE_PATH.get_or_init(StartupConfig::db_path_from_env)
}

/// Opens the store, runs `f`, and logs failures.
fn with_store<T>(
    op: &'static str,
    f: impl FnOnce(&Connection) -> Result<T, String>,
) -> Result<T, String> {
    let result = open_db(resolve_store_path())
        .map_err(|err| format!("store open failed: {err}"))
        .and_then(|conn| f(&conn));
    if let Err(message) = &result {
        error!("event=ffi_call module=ffi status=error op={op} error={message}");
    }
    result
}

fn item_service(conn: &Connection) -> Result<ItemService<SqliteShoppingItemRepository<'_>>, String> {
    SqliteShoppingItemRepository::try_new(conn)
        .map(ItemService::new)
        .map_err(|err| format!("item repo init failed: {err}"))
}

fn location_service(
    conn: &Connection,
) -> Result<LocationService<SqliteLocationRepository<'_>>, String> {
    SqliteLocationRepository::try_new(conn)
        .map(LocationService::new)
        .map_err(|err| format!("location repo init failed: {err}"))
}

fn load_item(
    service: &ItemService<SqliteShoppingItemRepository<'_>>,
    item_id: Option<&str>,
) -> Result<Option<ShoppingItem>, String> {
    let Some(raw) = item_id else {
        return Ok(None);
    };
    let id = parse_id("item_id", raw)?;
    let item = service
        .get_item(id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("shopping item not found: {id}"))?;
    Ok(Some(item))
}

fn location_names(conn: &Connection) -> Result<HashMap<Uuid, String>, String> {
    let locations = location_service(conn)?
        .list_locations()
        .map_err(|err| err.to_string())?;
    Ok(locations
        .into_iter()
        .map(|location| (location.uuid, location.name))
        .collect())
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid {field} `{raw}`"))
}

fn to_item_view(item: ShoppingItem, names: &HashMap<Uuid, String>) -> ItemView {
    ItemView {
        item_id: item.uuid.to_string(),
        location_name: names
            .get(&item.location_uuid)
            .cloned()
            .unwrap_or_default(),
        name: item.name,
        quantity: item.quantity,
        on_list: item.on_list,
        location_id: item.location_uuid.to_string(),
        visitation_order: item.visitation_order,
    }
}

fn to_location_view(summary: LocationSummary) -> LocationView {
    let LocationSummary {
        location,
        item_count,
    } = summary;
    LocationView {
        location_id: location.uuid.to_string(),
        is_unknown: location.is_unknown(),
        name: location.name,
        visitation_order: location.visitation_order,
        red: location.color.red,
        green: location.color.green,
        blue: location.color.blue,
        opacity: location.color.opacity,
        item_count,
    }
}

fn projection_label(view: Projection) -> &'static str {
    match view {
        Projection::ShoppingList => "shopping_list",
        Projection::Purchased => "purchased",
        Projection::Locations => "locations",
    }
}
