//! Shopping item domain model.
//!
//! # Invariants
//! - Every item belongs to exactly one location (`location_uuid`).
//! - `visitation_order` mirrors the owning location's order after every
//!   commit; persistence rewrites it, callers never choose it.
//! - `on_list == true` means "to buy", `false` means "purchased".

use crate::model::location::{LocationId, UNKNOWN_LOCATION_VISITATION_ORDER};
use crate::model::validation::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a shopping item.
pub type ShoppingItemId = Uuid;

/// Quantity used by new item drafts.
pub const DEFAULT_QUANTITY: i32 = 1;

/// Canonical shopping item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub uuid: ShoppingItemId,
    pub name: String,
    pub quantity: i32,
    pub on_list: bool,
    /// Denormalized copy of the owning location's visitation order.
    pub visitation_order: i32,
    pub location_uuid: LocationId,
}

impl ShoppingItem {
    /// Creates an item at `location_uuid` with a generated ID.
    ///
    /// `visitation_order` starts at the sentinel value and is replaced by the
    /// location's real order when the item is persisted.
    pub fn new(
        name: &str,
        quantity: i32,
        on_list: bool,
        location_uuid: LocationId,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            uuid: Uuid::new_v4(),
            name: normalize_name(name)?,
            quantity,
            on_list,
            visitation_order: UNKNOWN_LOCATION_VISITATION_ORDER,
            location_uuid,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid.is_nil() || self.location_uuid.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if self.quantity < 1 {
            return Err(ValidationError::QuantityBelowOne(self.quantity));
        }
        Ok(())
    }

    /// Returns whether the item is shown in the purchased list.
    pub fn is_purchased(&self) -> bool {
        !self.on_list
    }
}
