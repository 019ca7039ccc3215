//! Add-or-modify shopping item form.

use crate::form::session::{FormPhase, FormSession};
use crate::form::{refresh_set, DismissOutcome, FormError, FormOutcome, Projection};
use crate::model::location::LocationId;
use crate::model::shopping_item::{ShoppingItem, ShoppingItemId};
use crate::model::validation::is_committable_name;
use crate::repo::item_repo::ShoppingItemRepository;
use crate::service::item_service::{ItemFields, ItemService};

/// Presentation options fixed when the form is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFormOptions {
    /// False when opened from a location's detail view.
    pub allows_deletion: bool,
    /// Initial `on_list` for new items; false when opened from the purchased
    /// list.
    pub add_to_shopping_list: bool,
}

impl Default for ItemFormOptions {
    fn default() -> Self {
        Self {
            allows_deletion: true,
            add_to_shopping_list: true,
        }
    }
}

/// Draft-backed editor for one shopping item.
#[derive(Debug)]
pub struct ItemForm {
    session: FormSession<ShoppingItemId, ItemFields>,
    options: ItemFormOptions,
    /// `(on_list, location)` of the loaded item, for refresh computation.
    stored: Option<(bool, LocationId)>,
}

impl ItemForm {
    pub fn new(options: ItemFormOptions) -> Self {
        Self {
            session: FormSession::new(),
            options,
            stored: None,
        }
    }

    /// Copies `item` (or new-item defaults) into the draft, once per session.
    pub fn load(&mut self, item: Option<&ShoppingItem>) -> bool {
        let on_list = self.options.add_to_shopping_list;
        let loaded = self.session.load(item.map(|value| value.uuid), || match item {
            Some(value) => ItemFields::from(value),
            None => ItemFields {
                on_list,
                ..ItemFields::default()
            },
        });
        if loaded {
            self.stored = item.map(|value| (value.on_list, value.location_uuid));
        }
        loaded
    }

    pub fn draft(&self) -> &ItemFields {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> &mut ItemFields {
        self.session.draft_mut()
    }

    pub fn phase(&self) -> FormPhase {
        self.session.phase()
    }

    pub fn options(&self) -> ItemFormOptions {
        self.options
    }

    pub fn editing(&self) -> Option<ShoppingItemId> {
        self.session.editing()
    }

    pub fn can_commit(&self) -> bool {
        self.session.phase() == FormPhase::Editing && is_committable_name(&self.draft().name)
    }

    pub fn can_delete(&self) -> bool {
        self.options.allows_deletion
            && self.session.phase() == FormPhase::Editing
            && self.session.editing().is_some()
    }

    /// Creates or updates the item from the draft and closes the form.
    pub fn commit<R: ShoppingItemRepository>(
        &mut self,
        service: &ItemService<R>,
    ) -> Result<FormOutcome<ShoppingItem>, FormError> {
        self.session.ensure_editing()?;
        if !self.can_commit() {
            return Err(FormError::CannotCommit);
        }

        let outcome = match self.session.editing() {
            Some(id) => {
                let updated = service.update_item(id, self.draft())?;
                let mut refresh = vec![Projection::for_partition(updated.on_list)];
                if let Some((was_on_list, was_at)) = self.stored {
                    refresh.push(Projection::for_partition(was_on_list));
                    if was_at != updated.location_uuid {
                        refresh.push(Projection::Locations);
                    }
                }
                FormOutcome {
                    record: updated,
                    refresh: refresh_set(refresh),
                }
            }
            None => {
                let created = service.create_item(self.draft())?;
                FormOutcome {
                    refresh: refresh_set([
                        Projection::for_partition(created.on_list),
                        Projection::Locations,
                    ]),
                    record: created,
                }
            }
        };

        self.session.close();
        Ok(outcome)
    }

    pub fn cancel(&mut self) {
        self.session.close();
    }

    /// Confirms deletion: stages it and closes the form. The item is removed
    /// by [`ItemForm::finish_dismiss`].
    pub fn request_delete(&mut self) -> Result<ShoppingItemId, FormError> {
        if !self.options.allows_deletion {
            return Err(FormError::DeletionNotAllowed);
        }
        self.session.stage_delete()
    }

    /// Close-completion callback: runs the staged deletion, if any.
    pub fn finish_dismiss<R: ShoppingItemRepository>(
        &mut self,
        service: &ItemService<R>,
    ) -> Result<DismissOutcome, FormError> {
        let Some(id) = self.session.finish_dismiss() else {
            return Ok(DismissOutcome::default());
        };

        let deleted = service.delete_item(id)?;
        Ok(DismissOutcome {
            deleted: true,
            refresh: refresh_set([
                Projection::for_partition(deleted.on_list),
                Projection::Locations,
            ]),
        })
    }
}
