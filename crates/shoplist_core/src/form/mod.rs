//! Edit-staging forms (view-model layer).
//!
//! # Responsibility
//! - Hold a draft copy of an entity's editable fields, detached from the
//!   store, so leaving a form without saving changes nothing.
//! - Commit drafts through the services and report which list projections
//!   the caller must re-fetch.
//! - Defer confirmed deletions until the view has closed.
//!
//! # Invariants
//! - `load` initializes the draft exactly once per session.
//! - Deletion runs in `finish_dismiss`, never in `request_delete`.

pub mod item_form;
pub mod location_form;
pub mod session;

use crate::service::item_service::ItemServiceError;
use crate::service::location_service::LocationServiceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use session::FormPhase;

/// Sorted/filtered list a view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Projection {
    /// Items with `on_list == true`.
    ShoppingList,
    /// Items with `on_list == false`.
    Purchased,
    /// Locations with item counts.
    Locations,
}

impl Projection {
    /// Item list projection holding items with the given `on_list` value.
    pub fn for_partition(on_list: bool) -> Self {
        if on_list {
            Self::ShoppingList
        } else {
            Self::Purchased
        }
    }
}

/// Successful commit: the stored record plus projections to re-query.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOutcome<T> {
    pub record: T,
    pub refresh: Vec<Projection>,
}

/// Result of closing a form view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DismissOutcome {
    /// Whether a staged deletion ran.
    pub deleted: bool,
    pub refresh: Vec<Projection>,
}

/// Form-level errors.
#[derive(Debug)]
pub enum FormError {
    /// `load` has not been called for this session.
    NotLoaded,
    /// The session already committed, cancelled or staged a deletion.
    SessionClosed,
    /// Required fields are blank.
    CannotCommit,
    /// The form edits a new entity; there is nothing to delete.
    NothingToDelete,
    /// Deletion is disabled for this form (or target).
    DeletionNotAllowed,
    Location(LocationServiceError),
    Item(ItemServiceError),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "form draft has not been loaded"),
            Self::SessionClosed => write!(f, "form session is closed"),
            Self::CannotCommit => write!(f, "form cannot be saved: name is required"),
            Self::NothingToDelete => write!(f, "form has no stored entity to delete"),
            Self::DeletionNotAllowed => write!(f, "deletion is not allowed from this form"),
            Self::Location(err) => write!(f, "{err}"),
            Self::Item(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Location(err) => Some(err),
            Self::Item(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LocationServiceError> for FormError {
    fn from(value: LocationServiceError) -> Self {
        Self::Location(value)
    }
}

impl From<ItemServiceError> for FormError {
    fn from(value: ItemServiceError) -> Self {
        Self::Item(value)
    }
}

fn refresh_set(projections: impl IntoIterator<Item = Projection>) -> Vec<Projection> {
    let mut refresh: Vec<Projection> = projections.into_iter().collect();
    refresh.sort();
    refresh.dedup();
    refresh
}
