//! Edit-session state machine shared by the location and item forms.
//!
//! # Invariants
//! - The draft is initialized once per session; later loads are no-ops.
//! - A staged deletion runs only after the view reports it has closed.
//! - Nothing is written to the store while the session is `Editing`.

use crate::form::FormError;

/// Lifecycle of one form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Created, draft not loaded yet.
    Unloaded,
    /// Draft loaded; user edits go to the draft only.
    Editing,
    /// Commit, cancel or delete requested; waiting for the view to close.
    Closing,
    /// View closed and any staged deletion has run.
    Closed,
}

#[derive(Debug)]
pub(crate) struct FormSession<Id, Draft> {
    phase: FormPhase,
    editing: Option<Id>,
    draft: Draft,
    pending_delete: Option<Id>,
}

impl<Id: Copy, Draft: Default> FormSession<Id, Draft> {
    pub(crate) fn new() -> Self {
        Self {
            phase: FormPhase::Unloaded,
            editing: None,
            draft: Draft::default(),
            pending_delete: None,
        }
    }

    /// Loads the draft on first call. Returns whether this call loaded it.
    pub(crate) fn load(&mut self, editing: Option<Id>, init: impl FnOnce() -> Draft) -> bool {
        if self.phase != FormPhase::Unloaded {
            return false;
        }
        self.editing = editing;
        self.draft = init();
        self.phase = FormPhase::Editing;
        true
    }

    pub(crate) fn phase(&self) -> FormPhase {
        self.phase
    }

    pub(crate) fn editing(&self) -> Option<Id> {
        self.editing
    }

    pub(crate) fn draft(&self) -> &Draft {
        &self.draft
    }

    pub(crate) fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub(crate) fn ensure_editing(&self) -> Result<(), FormError> {
        match self.phase {
            FormPhase::Editing => Ok(()),
            FormPhase::Unloaded => Err(FormError::NotLoaded),
            FormPhase::Closing | FormPhase::Closed => Err(FormError::SessionClosed),
        }
    }

    /// Moves to `Closing` after a successful commit or a cancel.
    pub(crate) fn close(&mut self) {
        if matches!(self.phase, FormPhase::Unloaded | FormPhase::Editing) {
            self.phase = FormPhase::Closing;
        }
    }

    /// Marks the edited entity for deletion and closes the session.
    pub(crate) fn stage_delete(&mut self) -> Result<Id, FormError> {
        self.ensure_editing()?;
        let id = self.editing.ok_or(FormError::NothingToDelete)?;
        self.pending_delete = Some(id);
        self.phase = FormPhase::Closing;
        Ok(id)
    }

    /// Completes the dismissal and hands back the staged deletion, if any.
    pub(crate) fn finish_dismiss(&mut self) -> Option<Id> {
        if self.phase != FormPhase::Closing {
            return None;
        }
        self.phase = FormPhase::Closed;
        self.pending_delete.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{FormPhase, FormSession};
    use crate::form::FormError;

    #[test]
    fn load_runs_once_and_keeps_edits() {
        let mut session: FormSession<u8, String> = FormSession::new();
        assert!(session.load(Some(1), || "first".to_string()));
        session.draft_mut().push_str(" edited");

        assert!(!session.load(Some(2), || "second".to_string()));
        assert_eq!(session.draft(), "first edited");
        assert_eq!(session.editing(), Some(1));
    }

    #[test]
    fn staged_delete_is_released_only_by_finish_dismiss() {
        let mut session: FormSession<u8, String> = FormSession::new();
        session.load(Some(7), String::new);

        assert_eq!(session.stage_delete().unwrap(), 7);
        assert_eq!(session.phase(), FormPhase::Closing);
        assert_eq!(session.finish_dismiss(), Some(7));
        assert_eq!(session.phase(), FormPhase::Closed);
        assert_eq!(session.finish_dismiss(), None);
    }

    #[test]
    fn new_entity_session_has_nothing_to_delete() {
        let mut session: FormSession<u8, String> = FormSession::new();
        session.load(None, String::new);
        assert!(matches!(
            session.stage_delete(),
            Err(FormError::NothingToDelete)
        ));
    }

    #[test]
    fn unloaded_session_rejects_edits() {
        let session: FormSession<u8, String> = FormSession::new();
        assert!(matches!(session.ensure_editing(), Err(FormError::NotLoaded)));
    }
}
