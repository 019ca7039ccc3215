//! Shopping item use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete entry points for shopping items.
//! - Expose the shopping list and purchased list projections.
//!
//! # Invariants
//! - Items without an explicit location land in the "Unknown Location".
//! - `update_item` uses full field replacement semantics.
//! - Every item appears in exactly one of `list_on_list` / `list_purchased`.

use crate::model::location::LocationId;
use crate::model::shopping_item::{ShoppingItem, ShoppingItemId, DEFAULT_QUANTITY};
use crate::model::validation::{normalize_name, ValidationError};
use crate::repo::item_repo::{ItemListQuery, ItemOrder, ShoppingItemRepository};
use crate::repo::location_repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Editable item fields, used for create/update requests and form drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub quantity: i32,
    pub on_list: bool,
    /// `None` places the item at the unknown location.
    pub location_uuid: Option<LocationId>,
}

impl Default for ItemFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: DEFAULT_QUANTITY,
            on_list: true,
            location_uuid: None,
        }
    }
}

impl From<&ShoppingItem> for ItemFields {
    fn from(value: &ShoppingItem) -> Self {
        Self {
            name: value.name.clone(),
            quantity: value.quantity,
            on_list: value.on_list,
            location_uuid: Some(value.location_uuid),
        }
    }
}

/// Service error for shopping item use-cases.
#[derive(Debug)]
pub enum ItemServiceError {
    InvalidFields(ValidationError),
    ItemNotFound(ShoppingItemId),
    LocationNotFound(LocationId),
    Repo(RepoError),
}

impl Display for ItemServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFields(err) => write!(f, "invalid shopping item: {err}"),
            Self::ItemNotFound(id) => write!(f, "shopping item not found: {id}"),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFields(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ItemServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidFields(err),
            RepoError::ItemNotFound(id) => Self::ItemNotFound(id),
            RepoError::LocationNotFound(id) => Self::LocationNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ItemServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidFields(value)
    }
}

/// Shopping item service facade over repository implementations.
pub struct ItemService<R: ShoppingItemRepository> {
    repo: R,
}

impl<R: ShoppingItemRepository> ItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one item; it inherits its location's visitation order.
    pub fn create_item(&self, fields: &ItemFields) -> Result<ShoppingItem, ItemServiceError> {
        let location_uuid = self.resolve_location(fields.location_uuid)?;
        let item = ShoppingItem::new(&fields.name, fields.quantity, fields.on_list, location_uuid)?;
        let created = self.repo.create_item(&item)?;
        info!(
            "event=item_create module=service status=ok item_id={} location_id={} on_list={}",
            created.uuid, created.location_uuid, created.on_list
        );
        Ok(created)
    }

    /// Replaces all editable fields of one item.
    ///
    /// A location change moves the item to the new location's set and copies
    /// that location's visitation order in the same commit.
    pub fn update_item(
        &self,
        id: ShoppingItemId,
        fields: &ItemFields,
    ) -> Result<ShoppingItem, ItemServiceError> {
        let location_uuid = self.resolve_location(fields.location_uuid)?;
        let item = ShoppingItem {
            uuid: id,
            name: normalize_name(&fields.name)?,
            quantity: fields.quantity,
            on_list: fields.on_list,
            // Rewritten from the target location by the repository.
            visitation_order: 0,
            location_uuid,
        };
        let updated = self.repo.update_item(&item)?;
        info!(
            "event=item_update module=service status=ok item_id={} location_id={} on_list={}",
            updated.uuid, updated.location_uuid, updated.on_list
        );
        Ok(updated)
    }

    /// Moves one item to the shopping list (`true`) or purchased list.
    pub fn set_on_list(
        &self,
        id: ShoppingItemId,
        on_list: bool,
    ) -> Result<ShoppingItem, ItemServiceError> {
        self.repo.set_on_list(id, on_list).map_err(Into::into)
    }

    /// Deletes one item and returns the removed record.
    pub fn delete_item(&self, id: ShoppingItemId) -> Result<ShoppingItem, ItemServiceError> {
        let item = self
            .repo
            .get_item(id)?
            .ok_or(ItemServiceError::ItemNotFound(id))?;
        self.repo.delete_item(id)?;
        info!(
            "event=item_delete module=service status=ok item_id={} location_id={}",
            id, item.location_uuid
        );
        Ok(item)
    }

    pub fn get_item(&self, id: ShoppingItemId) -> RepoResult<Option<ShoppingItem>> {
        self.repo.get_item(id)
    }

    /// Items still to buy, sorted by name.
    pub fn list_on_list(&self) -> RepoResult<Vec<ShoppingItem>> {
        self.repo.list_items(&ItemListQuery {
            on_list: Some(true),
            ..ItemListQuery::default()
        })
    }

    /// Items still to buy, in shopping route order.
    pub fn list_on_list_by_visitation_order(&self) -> RepoResult<Vec<ShoppingItem>> {
        self.repo.list_items(&ItemListQuery {
            on_list: Some(true),
            location_uuid: None,
            order: ItemOrder::VisitationOrder,
        })
    }

    /// Purchased items, sorted by name.
    pub fn list_purchased(&self) -> RepoResult<Vec<ShoppingItem>> {
        self.repo.list_items(&ItemListQuery {
            on_list: Some(false),
            ..ItemListQuery::default()
        })
    }

    /// One location's item set, sorted by name.
    pub fn list_items_at_location(&self, location_uuid: LocationId) -> RepoResult<Vec<ShoppingItem>> {
        self.repo.list_items(&ItemListQuery {
            location_uuid: Some(location_uuid),
            ..ItemListQuery::default()
        })
    }

    fn resolve_location(&self, location_uuid: Option<LocationId>) -> RepoResult<LocationId> {
        match location_uuid {
            Some(id) => Ok(id),
            None => self.repo.unknown_location_id(),
        }
    }
}
