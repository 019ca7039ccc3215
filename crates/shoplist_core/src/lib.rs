//! Core domain logic for the shopping list.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use config::{ConfigError, StartupConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use form::item_form::{ItemForm, ItemFormOptions};
pub use form::location_form::LocationForm;
pub use form::{DismissOutcome, FormError, FormOutcome, FormPhase, Projection};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::location::{
    Location, LocationColor, LocationId, LocationSummary, UNKNOWN_LOCATION_NAME,
    UNKNOWN_LOCATION_VISITATION_ORDER,
};
pub use model::shopping_item::{ShoppingItem, ShoppingItemId};
pub use model::validation::ValidationError;
pub use repo::item_repo::{
    ItemListQuery, ItemOrder, ShoppingItemRepository, SqliteShoppingItemRepository,
};
pub use repo::location_repo::{
    LocationRepository, RepoError, RepoResult, SqliteLocationRepository,
};
pub use service::item_service::{ItemFields, ItemService, ItemServiceError};
pub use service::location_service::{
    LocationFields, LocationService, LocationServiceError, LocationUpdate,
};
pub use transfer::{
    export_snapshot, import_snapshot, is_store_unseeded, read_snapshot_dir, write_snapshot_dir,
    ImportSummary, Snapshot, TransferError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
