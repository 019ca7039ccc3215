//! Location use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/list entry points for locations.
//! - Guard the "Unknown Location" sentinel against user edits that would
//!   break its role.
//!
//! # Invariants
//! - The sentinel keeps its reserved visitation order; only name and color
//!   may change.
//! - User locations can never take the reserved order.
//! - Updates cascade `visitation_order` to every item at the location in the
//!   same commit (delegated to the repository transaction).

use crate::model::location::{
    Location, LocationColor, LocationId, LocationSummary, DEFAULT_VISITATION_ORDER,
    UNKNOWN_LOCATION_VISITATION_ORDER,
};
use crate::model::validation::{normalize_name, ValidationError};
use crate::repo::location_repo::{LocationRepository, RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Editable location fields, used for create requests and form drafts.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFields {
    pub name: String,
    pub visitation_order: i32,
    pub color: LocationColor,
}

impl Default for LocationFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            visitation_order: DEFAULT_VISITATION_ORDER,
            color: LocationColor::default(),
        }
    }
}

impl From<&Location> for LocationFields {
    fn from(value: &Location) -> Self {
        Self {
            name: value.name.clone(),
            visitation_order: value.visitation_order,
            color: value.color,
        }
    }
}

/// Result of a location update.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub location: Location,
    /// Items whose denormalized visitation order was rewritten.
    pub items_resynced: usize,
}

/// Service error for location use-cases.
#[derive(Debug)]
pub enum LocationServiceError {
    InvalidFields(ValidationError),
    /// A user location asked for the sentinel's reserved order.
    ReservedVisitationOrder,
    LocationNotFound(LocationId),
    /// The sentinel cannot be deleted.
    UnknownLocationProtected(LocationId),
    Repo(RepoError),
}

impl Display for LocationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFields(err) => write!(f, "invalid location: {err}"),
            Self::ReservedVisitationOrder => write!(
                f,
                "visitation order {UNKNOWN_LOCATION_VISITATION_ORDER} is reserved for the unknown location"
            ),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::UnknownLocationProtected(id) => {
                write!(f, "the unknown location cannot be deleted: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LocationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFields(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LocationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidFields(err),
            RepoError::LocationNotFound(id) => Self::LocationNotFound(id),
            RepoError::ProtectedLocation(id) => Self::UnknownLocationProtected(id),
            RepoError::ReservedVisitationOrder(_) => Self::ReservedVisitationOrder,
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for LocationServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidFields(value)
    }
}

/// Location service facade over repository implementations.
pub struct LocationService<R: LocationRepository> {
    repo: R,
}

impl<R: LocationRepository> LocationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one user location.
    pub fn create_location(
        &self,
        fields: &LocationFields,
    ) -> Result<Location, LocationServiceError> {
        if fields.visitation_order == UNKNOWN_LOCATION_VISITATION_ORDER {
            return Err(LocationServiceError::ReservedVisitationOrder);
        }
        let location = Location::new(&fields.name, fields.visitation_order, fields.color)?;
        let created = self.repo.create_location(&location)?;
        info!(
            "event=location_create module=service status=ok location_id={} visitation_order={}",
            created.uuid, created.visitation_order
        );
        Ok(created)
    }

    /// Applies `fields` to an existing location and cascades its order.
    ///
    /// For the sentinel, `fields.visitation_order` is ignored.
    pub fn update_location(
        &self,
        id: LocationId,
        fields: &LocationFields,
    ) -> Result<LocationUpdate, LocationServiceError> {
        let current = self
            .repo
            .get_location(id)?
            .ok_or(LocationServiceError::LocationNotFound(id))?;

        let visitation_order = if current.is_unknown() {
            UNKNOWN_LOCATION_VISITATION_ORDER
        } else if fields.visitation_order == UNKNOWN_LOCATION_VISITATION_ORDER {
            return Err(LocationServiceError::ReservedVisitationOrder);
        } else {
            fields.visitation_order
        };

        let updated = Location {
            uuid: id,
            name: normalize_name(&fields.name)?,
            visitation_order,
            color: fields.color,
        };
        let items_resynced = self.repo.update_location(&updated)?;
        info!(
            "event=location_update module=service status=ok location_id={} visitation_order={} items_resynced={}",
            id, visitation_order, items_resynced
        );
        Ok(LocationUpdate {
            location: updated,
            items_resynced,
        })
    }

    /// Moves the location's items to the sentinel and deletes it.
    ///
    /// Returns the number of items reassigned.
    pub fn delete_location(&self, id: LocationId) -> Result<usize, LocationServiceError> {
        let reassigned = self.repo.delete_location(id)?;
        info!(
            "event=location_delete module=service status=ok location_id={} items_reassigned={}",
            id, reassigned
        );
        Ok(reassigned)
    }

    /// Returns the sentinel, creating it on first use.
    pub fn unknown_location(&self) -> RepoResult<Location> {
        self.repo.ensure_unknown_location()
    }

    pub fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>> {
        self.repo.get_location(id)
    }

    pub fn find_location_by_name(&self, name: &str) -> RepoResult<Option<Location>> {
        self.repo.find_location_by_name(name)
    }

    /// Lists every location by visitation order, ties broken by name.
    pub fn list_locations(&self) -> RepoResult<Vec<Location>> {
        self.repo.list_locations()
    }

    /// Lists locations with their item counts, in visitation order.
    pub fn list_location_summaries(&self) -> RepoResult<Vec<LocationSummary>> {
        self.repo.list_location_summaries()
    }
}
