//! Save orchestration.
//!
//! ```text
//! begin_save ──► SaveTicket { identifier, payload } ──► gateway.save_shop
//!                                                            │
//! finish_save ◄──────────────── SyncResult<SaveResponse> ◄───┘
//!     │
//!     ├─ Err   ─► dirty = true, pending selection cleared, error returned
//!     └─ Ok    ─► dirty = false; a returned catalog is applied, which
//!                 reselects the saved shop and rebuilds the draft
//! ```
//!
//! The payload is a clone taken in `begin_save`. Edits made while the save
//! is in flight stay in the live draft but are not part of the request; a
//! successful save that returns a catalog replaces the draft, dropping them.

use shop_core::validation::{validate_label, validate_new_identifier};
use shop_core::ValidationError;
use tracing::{info, warn};

use super::{DraftReconciler, ShopDraft};
use crate::error::{SyncError, SyncResult};
use crate::protocol::SaveResponse;

/// A submitted draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub identifier: String,
    pub payload: ShopDraft,
}

impl DraftReconciler {
    /// Whether the save action is available.
    ///
    /// A new shop must pass every check `begin_save` applies; an existing
    /// one needs unsaved changes.
    pub fn can_save(&self) -> bool {
        match &self.draft {
            Some(draft) if self.create_mode => self.check_new(draft).is_ok(),
            Some(_) => self.dirty,
            None => false,
        }
    }

    /// Checks a new shop and returns its canonical identifier.
    fn check_new(&self, draft: &ShopDraft) -> SyncResult<String> {
        let identifier = validate_new_identifier(&draft.identifier, self.catalog.identifiers())?;
        validate_label("label", &draft.label)?;
        if draft.shop_type.is_empty() {
            return Err(ValidationError::Required {
                field: "type".into(),
            }
            .into());
        }
        Ok(identifier)
    }

    /// Validates and snapshots the draft for submission.
    ///
    /// For a new shop the identifier is canonicalized and written back to
    /// the live draft. The identifier becomes the pending selection, so the
    /// saved shop is reselected when the next catalog arrives.
    pub fn begin_save(&mut self) -> SyncResult<SaveTicket> {
        let draft = self.draft.as_ref().ok_or(SyncError::NoDraft)?;
        let is_new = self.create_mode || draft.is_new;
        if !is_new && !self.dirty {
            return Err(SyncError::NothingToSave);
        }

        let mut payload = draft.clone();
        payload.is_new = is_new;
        if is_new {
            payload.identifier = self.check_new(draft)?;
            if let Some(live) = self.draft.as_mut() {
                live.identifier = payload.identifier.clone();
            }
        }

        self.pending_selection = Some(payload.identifier.clone());
        info!(shop = %payload.identifier, is_new, "Save submitted");
        Ok(SaveTicket {
            identifier: payload.identifier.clone(),
            payload,
        })
    }

    /// Applies the outcome of a save.
    ///
    /// Failures are handed back so the caller can surface them; the draft
    /// is left as it is and stays dirty.
    pub fn finish_save(&mut self, outcome: SyncResult<SaveResponse>) -> SyncResult<()> {
        match outcome {
            Ok(response) => {
                self.dirty = false;
                info!(
                    selected = ?self.pending_selection,
                    refreshed = response.payload.is_some(),
                    "Save acknowledged"
                );
                if let Some(overview) = response.payload {
                    self.set_admin_data(overview);
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Save failed");
                self.pending_selection = None;
                self.dirty = true;
                Err(err)
            }
        }
    }

    /// Discards unsaved edits: a new shop is cancelled, an existing one is
    /// rebuilt from its snapshot.
    pub fn reset(&mut self) {
        if self.create_mode {
            self.cancel_create();
            return;
        }
        if let Some(draft) = self.build_selected() {
            self.draft = Some(draft);
            self.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::fixtures::{editing, loaded, overview};
    use crate::draft::DraftState;
    use serde_json::json;

    #[test]
    fn test_can_save_rules() {
        let mut reconciler = editing("corner");
        assert!(!reconciler.can_save());
        reconciler.set_field("label", &json!("Corner Plus")).unwrap();
        assert!(reconciler.can_save());

        let mut reconciler = loaded();
        reconciler.start_create(None);
        assert!(!reconciler.can_save());
        reconciler.set_field("identifier", &json!("!!!")).unwrap();
        reconciler.set_field("label", &json!("New")).unwrap();
        assert!(!reconciler.can_save());
        reconciler.set_field("identifier", &json!("New Shop")).unwrap();
        assert!(reconciler.can_save());
    }

    #[test]
    fn test_taken_identifier_disables_save() {
        let mut reconciler = loaded();
        reconciler.start_create(None);
        reconciler.set_field("identifier", &json!("Corner")).unwrap();
        reconciler.set_field("label", &json!("Another Corner")).unwrap();
        assert!(!reconciler.can_save());
        assert!(reconciler.begin_save().unwrap_err().is_validation());

        reconciler.set_field("identifier", &json!("Corner 2")).unwrap();
        assert!(reconciler.can_save());
    }

    #[test]
    fn test_clean_existing_draft_has_nothing_to_save() {
        let mut reconciler = editing("corner");
        assert!(matches!(reconciler.begin_save(), Err(SyncError::NothingToSave)));
        assert_eq!(reconciler.pending_selection(), None);
    }

    #[test]
    fn test_begin_save_canonicalizes_new_identifier() {
        let mut reconciler = loaded();
        reconciler.start_create(None);
        reconciler.set_field("identifier", &json!(" My Shop! ")).unwrap();
        reconciler.set_field("label", &json!("My Shop")).unwrap();

        let ticket = reconciler.begin_save().unwrap();
        assert_eq!(ticket.identifier, "my_shop");
        assert!(ticket.payload.is_new);
        assert_eq!(reconciler.draft().unwrap().identifier, "my_shop");
        assert_eq!(reconciler.pending_selection(), Some("my_shop"));
    }

    #[test]
    fn test_begin_save_rejects_blank_and_taken_identifiers() {
        let mut reconciler = loaded();
        reconciler.start_create(None);
        reconciler.set_field("label", &json!("Copy")).unwrap();

        reconciler.set_field("identifier", &json!("___")).unwrap();
        assert!(reconciler.begin_save().unwrap_err().is_validation());

        reconciler.set_field("identifier", &json!("Corner")).unwrap();
        assert!(reconciler.begin_save().unwrap_err().is_validation());
        assert_eq!(reconciler.pending_selection(), None);
    }

    #[test]
    fn test_failed_save_keeps_draft_dirty() {
        let mut reconciler = editing("corner");
        reconciler.set_field("label", &json!("Corner Plus")).unwrap();
        reconciler.begin_save().unwrap();

        let result = reconciler.finish_save(Err(SyncError::CommitRejected {
            message: Some("Label too long".into()),
        }));
        assert!(matches!(result, Err(SyncError::CommitRejected { .. })));
        assert!(reconciler.is_dirty());
        assert_eq!(reconciler.pending_selection(), None);
        assert_eq!(reconciler.draft().unwrap().label, "Corner Plus");
        assert!(reconciler.can_save());
    }

    #[test]
    fn test_successful_create_reselects_saved_shop() {
        let mut reconciler = editing("corner");
        reconciler.start_create(Some(crate::draft::Coords::new(5.0, 5.0, 5.0, 0.0)));
        reconciler.set_field("identifier", &json!("New Shop")).unwrap();
        reconciler.set_field("label", &json!("New Shop")).unwrap();
        let ticket = reconciler.begin_save().unwrap();

        let mut refreshed = overview();
        let mut saved = refreshed.shops[1].clone();
        saved.identifier = ticket.identifier.clone();
        saved.label = "New Shop".into();
        refreshed.shops.insert(0, saved);

        reconciler
            .finish_save(Ok(SaveResponse {
                success: true,
                message: None,
                payload: Some(refreshed),
            }))
            .unwrap();

        assert_eq!(reconciler.state(), DraftState::EditingExisting);
        assert_eq!(reconciler.selected(), Some("new_shop"));
        assert_eq!(reconciler.draft().unwrap().identifier, "new_shop");
        assert!(!reconciler.is_dirty());
    }

    #[test]
    fn test_success_without_catalog_keeps_draft() {
        let mut reconciler = editing("corner");
        reconciler.set_field("label", &json!("Corner Plus")).unwrap();
        reconciler.begin_save().unwrap();
        reconciler
            .finish_save(Ok(SaveResponse {
                success: true,
                message: None,
                payload: None,
            }))
            .unwrap();

        assert!(!reconciler.is_dirty());
        assert_eq!(reconciler.draft().unwrap().label, "Corner Plus");
    }

    #[test]
    fn test_edits_during_save_are_dropped_by_refresh() {
        let mut reconciler = editing("corner");
        reconciler.set_field("label", &json!("Submitted")).unwrap();
        let ticket = reconciler.begin_save().unwrap();
        reconciler.set_field("label", &json!("Typed while saving")).unwrap();
        assert_eq!(ticket.payload.label, "Submitted");

        reconciler
            .finish_save(Ok(SaveResponse {
                success: true,
                message: None,
                payload: Some(overview()),
            }))
            .unwrap();
        assert_eq!(reconciler.draft().unwrap().label, "Corner Store");
    }

    #[test]
    fn test_create_cancel_select_leaves_no_residue() {
        let mut reconciler = editing("corner");
        reconciler.start_create(None);
        reconciler.set_field("identifier", &json!("Test Shop")).unwrap();
        reconciler.set_field("label", &json!("Test Shop")).unwrap();
        reconciler.cancel_create();
        reconciler.select_shop("harbor").unwrap();

        let draft = reconciler.draft().unwrap();
        assert_eq!(draft.identifier, "harbor");
        assert_ne!(draft.identifier, "test_shop");
        assert!(!reconciler.can_save());
    }

    #[test]
    fn test_cancel_drops_pending_selection() {
        let mut reconciler = editing("corner");
        reconciler.start_create(None);
        reconciler.set_field("identifier", &json!("New Shop")).unwrap();
        reconciler.set_field("label", &json!("New Shop")).unwrap();
        reconciler.begin_save().unwrap();
        reconciler.cancel_create();
        assert_eq!(reconciler.pending_selection(), None);

        reconciler
            .finish_save(Ok(SaveResponse {
                success: true,
                message: None,
                payload: None,
            }))
            .unwrap();
        reconciler.select_shop("harbor").unwrap();

        let mut refreshed = overview();
        let mut saved = refreshed.shops[0].clone();
        saved.identifier = "new_shop".into();
        refreshed.shops.insert(0, saved);
        reconciler.set_admin_data(refreshed);

        assert_eq!(reconciler.selected(), Some("harbor"));
        assert_eq!(reconciler.draft().unwrap().identifier, "harbor");
    }

    #[test]
    fn test_reset() {
        let mut reconciler = editing("corner");
        reconciler.set_field("label", &json!("Scratch")).unwrap();
        reconciler.reset();
        assert_eq!(reconciler.draft().unwrap().label, "Corner Store");
        assert!(!reconciler.is_dirty());

        reconciler.start_create(None);
        reconciler.reset();
        assert_eq!(reconciler.state(), DraftState::EditingExisting);
        assert_eq!(reconciler.draft().unwrap().identifier, "corner");
    }
}
