//! Ownership Gate
//!
//! Every note operation runs on behalf of a verified subject (the `userId`
//! from a validated token). Notes are addressed by the compound key
//! (`noteId`, `userId` = subject), so a note owned by someone else is
//! indistinguishable from one that does not exist.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, ValidationError};
use crate::models::{self, Note, NoteDraft};
use crate::store::{from_item, to_item, ItemKey, Store, NOTE_OWNER_INDEX};
use crate::validators::{is_valid_content, is_valid_title};

#[derive(Clone)]
pub struct NoteGate {
    store: Arc<dyn Store>,
    table: String,
}

impl NoteGate {
    pub fn new(store: Arc<dyn Store>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Notes owned by `subject_id`, most recently created first
    #[tracing::instrument(name = "list_notes", skip(self))]
    pub async fn list(&self, subject_id: &str) -> Result<Vec<Note>, AppError> {
        let items = self
            .store
            .query_index(&self.table, NOTE_OWNER_INDEX, subject_id, true)
            .await?;

        let notes = items
            .into_iter()
            .map(from_item::<Note>)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = notes.len(), "Notes listed");
        Ok(notes)
    }

    /// Create a note owned by `subject_id`.
    ///
    /// A client-supplied owner is ignored.
    #[tracing::instrument(name = "create_note", skip(self, draft))]
    pub async fn create(&self, subject_id: &str, draft: NoteDraft) -> Result<Note, AppError> {
        if let Some(claimed) = draft.owner_id.as_deref().filter(|owner| *owner != subject_id) {
            tracing::warn!(claimed_owner = %claimed, "Ignoring client-supplied note owner");
        }

        let title = is_valid_title(draft.title.as_deref().unwrap_or_default())?;
        let content = is_valid_content(draft.content.as_deref().unwrap_or_default())?;

        let now = models::now();
        let note = Note {
            note_id: Uuid::new_v4().to_string(),
            owner_id: subject_id.to_string(),
            title,
            content,
            created_at: now,
            updated_at: now,
        };

        self.store.put_item(&self.table, to_item(&note)?).await?;

        tracing::info!(note_id = %note.note_id, "Note created");
        Ok(note)
    }

    /// A single note, if `subject_id` owns it
    #[tracing::instrument(name = "get_note", skip(self))]
    pub async fn get(&self, subject_id: &str, note_id: &str) -> Result<Note, AppError> {
        let item = self
            .store
            .get_item(&self.table, &owned_key(note_id, subject_id))
            .await?;
        Ok(from_item(item)?)
    }

    /// Update title and/or content of a note `subject_id` owns.
    ///
    /// Fields absent from `changes` keep their stored value. `noteId`,
    /// owner and `createdAt` are preserved; `updatedAt` is refreshed.
    ///
    /// The read and the write are two separate store operations with no
    /// condition between them: a delete landing in between is undone, and
    /// the note reappears with the updated fields.
    ///
    /// # Errors
    /// - `NotFound` if no note with this id belongs to `subject_id`
    /// - `Validation(OwnershipChange)` if `changes` names a different owner
    #[tracing::instrument(name = "update_note", skip(self, changes))]
    pub async fn update(
        &self,
        subject_id: &str,
        note_id: &str,
        changes: NoteDraft,
    ) -> Result<Note, AppError> {
        if changes
            .owner_id
            .as_deref()
            .map_or(false, |owner| owner != subject_id)
        {
            return Err(AppError::Validation(ValidationError::OwnershipChange));
        }

        let existing = self.get(subject_id, note_id).await?;

        let title = match changes.title.as_deref() {
            Some(title) => is_valid_title(title)?,
            None => existing.title,
        };
        let content = match changes.content.as_deref() {
            Some(content) => is_valid_content(content)?,
            None => existing.content,
        };

        let updated = Note {
            note_id: existing.note_id,
            owner_id: existing.owner_id,
            title,
            content,
            created_at: existing.created_at,
            updated_at: models::now().max(existing.updated_at),
        };

        self.store.put_item(&self.table, to_item(&updated)?).await?;

        tracing::info!(note_id = %updated.note_id, "Note updated");
        Ok(updated)
    }

    /// Delete a note `subject_id` owns
    #[tracing::instrument(name = "delete_note", skip(self))]
    pub async fn delete(&self, subject_id: &str, note_id: &str) -> Result<(), AppError> {
        self.store
            .delete_item(&self.table, &owned_key(note_id, subject_id))
            .await?;

        tracing::info!(note_id = %note_id, "Note deleted");
        Ok(())
    }
}

fn owned_key(note_id: &str, subject_id: &str) -> ItemKey {
    ItemKey::compound(note_id, subject_id)
}
