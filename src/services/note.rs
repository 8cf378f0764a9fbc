//! Note service
//!
//! Personal notes: every operation needs a logged-in user, and a note is
//! only reachable by its author. Slugs are assigned by
//! [`crate::policy::slug`] and checked for uniqueness before saving; the
//! database constraint catches the remaining race.

use crate::db::is_unique_violation;
use crate::db::repositories::note::NewNote;
use crate::db::repositories::NoteRepository;
use crate::models::{Note, NoteInput, User};
use crate::policy::access::authorize_found;
use crate::policy::slug::{assign_slug, conflict, ensure_unique};
use crate::policy::{check_text, require_login, AccessError, FieldError};
use anyhow::Context;
use std::sync::Arc;

/// Maximum note title length
pub const MAX_TITLE_LEN: usize = 100;

/// Error types for note service operations
#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Form rejected; one entry per offending field
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A validated note form, ready to be stored
struct CleanNote {
    title: String,
    text: String,
    slug: String,
}

/// Note service
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>) -> Self {
        Self { repo }
    }

    /// The viewer's own notes
    pub async fn list(&self, viewer: Option<&User>) -> Result<Vec<Note>, NoteServiceError> {
        let user = require_login(viewer)?;
        let notes = self
            .repo
            .list_by_author(user.id)
            .await
            .context("Failed to list notes")?;
        Ok(notes)
    }

    /// A note by slug, if the viewer wrote it
    pub async fn get(&self, viewer: Option<&User>, slug: &str) -> Result<Note, NoteServiceError> {
        require_login(viewer)?;
        let note = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get note")?;
        Ok(authorize_found(viewer, note)?)
    }

    /// Create a note owned by the viewer
    pub async fn create(
        &self,
        viewer: Option<&User>,
        input: &NoteInput,
    ) -> Result<Note, NoteServiceError> {
        let user = require_login(viewer)?;
        let clean = self.clean(input, None).await?;

        let created = self
            .repo
            .create(NewNote {
                title: &clean.title,
                text: &clean.text,
                slug: &clean.slug,
                author_id: user.id,
            })
            .await;

        let note = map_slug_race(created, &clean.slug)?;
        tracing::info!(note_id = note.id, slug = %note.slug, author_id = user.id, "Note created");
        Ok(note)
    }

    /// Replace title, text and slug of one of the viewer's notes
    pub async fn update(
        &self,
        viewer: Option<&User>,
        slug: &str,
        input: &NoteInput,
    ) -> Result<Note, NoteServiceError> {
        let existing = self.get(viewer, slug).await?;
        let clean = self.clean(input, Some(existing.id)).await?;

        let changed = Note {
            title: clean.title,
            text: clean.text,
            slug: clean.slug,
            ..existing
        };
        let saved = self.repo.update(&changed).await;

        let note = map_slug_race(saved, &changed.slug)?;
        tracing::info!(note_id = note.id, slug = %note.slug, "Note updated");
        Ok(note)
    }

    /// Delete one of the viewer's notes
    pub async fn delete(&self, viewer: Option<&User>, slug: &str) -> Result<(), NoteServiceError> {
        let note = self.get(viewer, slug).await?;
        self.repo
            .delete(note.id)
            .await
            .context("Failed to delete note")?;
        tracing::info!(note_id = note.id, slug = %note.slug, "Note deleted");
        Ok(())
    }

    /// Validate form fields and settle the slug. `own_id` is the note being
    /// edited, whose current slug does not count as taken.
    async fn clean(
        &self,
        input: &NoteInput,
        own_id: Option<i64>,
    ) -> Result<CleanNote, NoteServiceError> {
        let mut errors = Vec::new();

        if let Err(e) = check_text("title", &input.title, Some(MAX_TITLE_LEN)) {
            errors.push(e);
        }
        if let Err(e) = check_text("text", &input.text, None) {
            errors.push(e);
        }

        let title = input.title.trim();
        let slug = match input.supplied_slug() {
            Some(supplied) => assign_slug(Some(supplied), title).map(Some),
            // Nothing to derive from; the title error already covers it
            None if title.is_empty() => Ok(None),
            None => assign_slug(None, title).map(Some),
        };

        let slug = match slug {
            Ok(Some(slug)) => {
                let taken = self
                    .repo
                    .slug_exists(&slug, own_id)
                    .await
                    .context("Failed to check slug")?;
                if let Err(e) = ensure_unique(&slug, taken) {
                    errors.push(e);
                }
                slug
            }
            Ok(None) => String::new(),
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        if !errors.is_empty() {
            tracing::debug!(?errors, "Note form rejected");
            return Err(NoteServiceError::Validation(errors));
        }

        Ok(CleanNote {
            title: title.to_string(),
            text: input.text.clone(),
            slug,
        })
    }
}

/// A concurrent save can take the slug between the check and the write;
/// the UNIQUE constraint then reports it and it becomes the usual conflict.
fn map_slug_race(result: anyhow::Result<Note>, slug: &str) -> Result<Note, NoteServiceError> {
    match result {
        Ok(note) => Ok(note),
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(slug, "Slug taken by a concurrent save");
            Err(NoteServiceError::Validation(vec![conflict(slug)]))
        }
        Err(e) => Err(NoteServiceError::InternalError(e.context("Failed to save note"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::SqlxNoteRepository;
    use crate::policy::slug::SLUG_WARNING;
    use crate::policy::REQUIRED_MESSAGE;

    async fn setup() -> (NoteService, User, User) {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "author").await;
        let reader = insert_user(&pool, "reader").await;
        (NoteService::new(SqlxNoteRepository::boxed(pool)), author, reader)
    }

    fn validation(err: NoteServiceError) -> Vec<FieldError> {
        match err {
            NoteServiceError::Validation(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_title() {
        let (service, author, _) = setup().await;

        let note = service
            .create(Some(&author), &NoteInput::new("Новый заголовок", "Текст"))
            .await
            .expect("Failed to create note");

        assert_eq!(note.slug, "novyij-zagolovok");
        assert_eq!(note.author_id, author.id);
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_slug() {
        let (service, author, _) = setup().await;
        let input = NoteInput::new("Заголовок", "Текст").with_slug("my_slug");

        let note = service.create(Some(&author), &input).await.unwrap();
        assert_eq!(note.slug, "my_slug");
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (service, author, reader) = setup().await;
        let input = NoteInput::new("Заголовок", "Текст").with_slug("same");
        service.create(Some(&author), &input).await.unwrap();

        let errors = validation(service.create(Some(&reader), &input).await.unwrap_err());
        assert_eq!(errors, vec![FieldError::new("slug", format!("same{}", SLUG_WARNING))]);
        assert_eq!(service.list(Some(&reader)).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_derived_slug_collision_rejected() {
        let (service, author, _) = setup().await;
        service
            .create(Some(&author), &NoteInput::new("Заголовок", "раз"))
            .await
            .unwrap();

        let errors = validation(
            service
                .create(Some(&author), &NoteInput::new("Заголовок", "два"))
                .await
                .unwrap_err(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "slug");
        assert!(errors[0].message.starts_with("zagolovok"));
    }

    #[tokio::test]
    async fn test_invalid_form_collects_all_errors() {
        let (service, author, _) = setup().await;
        let input = NoteInput::new("", "").with_slug("bad slug!");

        let errors = validation(service.create(Some(&author), &input).await.unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "text", "slug"]);
        assert_eq!(errors[0].message, REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_title_too_long() {
        let (service, author, _) = setup().await;
        let input = NoteInput::new("я".repeat(MAX_TITLE_LEN + 1), "Текст").with_slug("ok");

        let errors = validation(service.create(Some(&author), &input).await.unwrap_err());
        assert_eq!(errors[0].field, "title");
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthenticated() {
        let (service, _, _) = setup().await;

        let err = service.create(None, &NoteInput::new("t", "x")).await.unwrap_err();
        assert!(matches!(err, NoteServiceError::Access(AccessError::Unauthenticated)));

        let err = service.get(None, "missing").await.unwrap_err();
        assert!(matches!(err, NoteServiceError::Access(AccessError::Unauthenticated)));

        let err = service.list(None).await.unwrap_err();
        assert!(matches!(err, NoteServiceError::Access(AccessError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_foreign_note_is_not_found() {
        let (service, author, reader) = setup().await;
        let note = service
            .create(Some(&author), &NoteInput::new("Секрет", "Текст"))
            .await
            .unwrap();

        for result in [
            service.get(Some(&reader), &note.slug).await.map(|_| ()),
            service
                .update(Some(&reader), &note.slug, &NoteInput::new("x", "y"))
                .await
                .map(|_| ()),
            service.delete(Some(&reader), &note.slug).await,
        ] {
            assert!(matches!(
                result,
                Err(NoteServiceError::Access(AccessError::NotFound))
            ));
        }

        let stored = service.get(Some(&author), &note.slug).await.unwrap();
        assert_eq!(stored.title, "Секрет");
    }

    #[tokio::test]
    async fn test_update_keeps_own_slug_and_can_rename() {
        let (service, author, _) = setup().await;
        let note = service
            .create(Some(&author), &NoteInput::new("Заметка", "Текст"))
            .await
            .unwrap();

        let same_slug = NoteInput::new("Заметка", "Новый текст").with_slug(note.slug.clone());
        let updated = service.update(Some(&author), &note.slug, &same_slug).await.unwrap();
        assert_eq!(updated.text, "Новый текст");
        assert_eq!(updated.slug, note.slug);

        let renamed = NoteInput::new("Заметка", "Текст").with_slug("renamed");
        service.update(Some(&author), &note.slug, &renamed).await.unwrap();
        assert!(service.get(Some(&author), "renamed").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_own_note() {
        let (service, author, _) = setup().await;
        let note = service
            .create(Some(&author), &NoteInput::new("Удалить", "Текст"))
            .await
            .unwrap();

        service.delete(Some(&author), &note.slug).await.unwrap();
        assert!(service.list(Some(&author)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_contains_only_own_notes() {
        let (service, author, reader) = setup().await;
        service.create(Some(&author), &NoteInput::new("Раз", "т")).await.unwrap();
        service.create(Some(&reader), &NoteInput::new("Два", "т")).await.unwrap();

        let titles: Vec<String> = service
            .list(Some(&author))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Раз"]);
    }
}
