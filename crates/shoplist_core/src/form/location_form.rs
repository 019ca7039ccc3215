//! Add-or-modify location form.
//!
//! # Invariants
//! - The sentinel's visitation order is never shown nor committed from the
//!   draft.
//! - The sentinel cannot be staged for deletion.

use crate::form::session::{FormPhase, FormSession};
use crate::form::{refresh_set, DismissOutcome, FormError, FormOutcome, Projection};
use crate::model::location::{Location, LocationId};
use crate::model::validation::is_committable_name;
use crate::repo::location_repo::LocationRepository;
use crate::service::location_service::{LocationFields, LocationService};

/// Draft-backed editor for one location.
#[derive(Debug)]
pub struct LocationForm {
    session: FormSession<LocationId, LocationFields>,
    editing_unknown: bool,
}

impl Default for LocationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationForm {
    pub fn new() -> Self {
        Self {
            session: FormSession::new(),
            editing_unknown: false,
        }
    }

    /// Copies `location` (or the new-location defaults) into the draft.
    ///
    /// Only the first call per session has an effect; returns whether this
    /// call loaded the draft.
    pub fn load(&mut self, location: Option<&Location>) -> bool {
        let loaded = self.session.load(location.map(|value| value.uuid), || {
            location.map(LocationFields::from).unwrap_or_default()
        });
        if loaded {
            self.editing_unknown = location.is_some_and(Location::is_unknown);
        }
        loaded
    }

    pub fn draft(&self) -> &LocationFields {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> &mut LocationFields {
        self.session.draft_mut()
    }

    pub fn phase(&self) -> FormPhase {
        self.session.phase()
    }

    /// Stored location being edited; `None` when adding.
    pub fn editing(&self) -> Option<LocationId> {
        self.session.editing()
    }

    /// Whether the visitation order control is shown (false for the sentinel).
    pub fn shows_visitation_order(&self) -> bool {
        !self.editing_unknown
    }

    /// Whether "Save" is enabled.
    pub fn can_commit(&self) -> bool {
        self.session.phase() == FormPhase::Editing && is_committable_name(&self.draft().name)
    }

    /// Whether "Delete This Location" is offered.
    pub fn can_delete(&self) -> bool {
        self.session.phase() == FormPhase::Editing
            && self.session.editing().is_some()
            && !self.editing_unknown
    }

    /// Creates or updates the location from the draft and closes the form.
    ///
    /// On error the session stays open so the user can fix the draft.
    pub fn commit<R: LocationRepository>(
        &mut self,
        service: &LocationService<R>,
    ) -> Result<FormOutcome<Location>, FormError> {
        self.session.ensure_editing()?;
        if !self.can_commit() {
            return Err(FormError::CannotCommit);
        }

        let outcome = match self.session.editing() {
            Some(id) => {
                let update = service.update_location(id, self.draft())?;
                let mut refresh = vec![Projection::Locations];
                if update.items_resynced > 0 {
                    refresh.extend([Projection::ShoppingList, Projection::Purchased]);
                }
                FormOutcome {
                    record: update.location,
                    refresh: refresh_set(refresh),
                }
            }
            None => FormOutcome {
                record: service.create_location(self.draft())?,
                refresh: vec![Projection::Locations],
            },
        };

        self.session.close();
        Ok(outcome)
    }

    /// Discards the draft.
    pub fn cancel(&mut self) {
        self.session.close();
    }

    /// Confirms deletion: stages it and closes the form. The location is
    /// removed by [`LocationForm::finish_dismiss`].
    pub fn request_delete(&mut self) -> Result<LocationId, FormError> {
        if self.editing_unknown {
            return Err(FormError::DeletionNotAllowed);
        }
        self.session.stage_delete()
    }

    /// Close-completion callback: runs the staged deletion, if any.
    pub fn finish_dismiss<R: LocationRepository>(
        &mut self,
        service: &LocationService<R>,
    ) -> Result<DismissOutcome, FormError> {
        let Some(id) = self.session.finish_dismiss() else {
            return Ok(DismissOutcome::default());
        };

        let reassigned = service.delete_location(id)?;
        let mut refresh = vec![Projection::Locations];
        if reassigned > 0 {
            refresh.extend([Projection::ShoppingList, Projection::Purchased]);
        }
        Ok(DismissOutcome {
            deleted: true,
            refresh: refresh_set(refresh),
        })
    }
}
