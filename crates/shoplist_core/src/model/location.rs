//! Location domain model.
//!
//! # Responsibility
//! - Define the shopping route stop that items are grouped under.
//! - Own the "Unknown Location" sentinel constants.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another location.
//! - User locations keep `visitation_order` inside `1..=100`.
//! - The sentinel is the only location carrying
//!   `UNKNOWN_LOCATION_VISITATION_ORDER`.
//! - Locations never own item lifetime; the item set is derived by query.

use crate::model::validation::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a location.
pub type LocationId = Uuid;

/// Lowest user-assignable visitation order.
pub const MIN_VISITATION_ORDER: i32 = 1;
/// Highest user-assignable visitation order.
pub const MAX_VISITATION_ORDER: i32 = 100;
/// Visitation order used by new location drafts.
pub const DEFAULT_VISITATION_ORDER: i32 = 50;
/// Reserved order marking the sentinel; sorts after every user location.
pub const UNKNOWN_LOCATION_VISITATION_ORDER: i32 = i32::MAX;
/// Display name of the sentinel location.
pub const UNKNOWN_LOCATION_NAME: &str = "Unknown Location";

/// Display tint of a location. Channels are within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub opacity: f64,
}

impl LocationColor {
    pub const fn new(red: f64, green: f64, blue: f64, opacity: f64) -> Self {
        Self {
            red,
            green,
            blue,
            opacity,
        }
    }

    /// Tint given to the sentinel when it is created.
    pub const fn unknown_location() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("opacity", self.opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ColorChannelOutOfRange { channel, value });
            }
        }
        Ok(())
    }
}

/// Canonical location record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LocationWire")]
pub struct Location {
    pub uuid: LocationId,
    pub name: String,
    /// Route position; `UNKNOWN_LOCATION_VISITATION_ORDER` for the sentinel.
    pub visitation_order: i32,
    pub color: LocationColor,
}

#[derive(Deserialize)]
struct LocationWire {
    uuid: LocationId,
    name: String,
    visitation_order: i32,
    color: LocationColor,
}

impl TryFrom<LocationWire> for Location {
    type Error = ValidationError;

    fn try_from(value: LocationWire) -> Result<Self, Self::Error> {
        let location = Self {
            uuid: value.uuid,
            name: value.name,
            visitation_order: value.visitation_order,
            color: value.color,
        };
        location.validate()?;
        Ok(location)
    }
}

impl Location {
    /// Creates a user location with a generated ID.
    ///
    /// The name is trimmed; blank names are rejected. The order must be a user
    /// order; the reserved sentinel order is rejected too.
    pub fn new(
        name: &str,
        visitation_order: i32,
        color: LocationColor,
    ) -> Result<Self, ValidationError> {
        if !is_user_visitation_order(visitation_order) {
            return Err(ValidationError::VisitationOrderOutOfRange(visitation_order));
        }
        let location = Self {
            uuid: Uuid::new_v4(),
            name: normalize_name(name)?,
            visitation_order,
            color,
        };
        location.validate()?;
        Ok(location)
    }

    /// Builds a fresh sentinel record. Persistence decides whether it is kept.
    pub fn unknown() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: UNKNOWN_LOCATION_NAME.to_string(),
            visitation_order: UNKNOWN_LOCATION_VISITATION_ORDER,
            color: LocationColor::unknown_location(),
        }
    }

    /// Returns whether this record is the "Unknown Location" sentinel.
    pub fn is_unknown(&self) -> bool {
        self.visitation_order == UNKNOWN_LOCATION_VISITATION_ORDER
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if !self.is_unknown() && !is_user_visitation_order(self.visitation_order) {
            return Err(ValidationError::VisitationOrderOutOfRange(
                self.visitation_order,
            ));
        }
        self.color.validate()
    }
}

/// Location list row: the record plus the size of its item set.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSummary {
    pub location: Location,
    pub item_count: u32,
}

/// Returns whether `value` may be assigned by a user.
pub fn is_user_visitation_order(value: i32) -> bool {
    (MIN_VISITATION_ORDER..=MAX_VISITATION_ORDER).contains(&value)
}
