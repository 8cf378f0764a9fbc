//! Note repository
//!
//! Database operations for notes. Slug uniqueness is enforced by the
//! `notes.slug` UNIQUE constraint; a violating insert or update surfaces
//! as an error that `db::is_unique_violation` recognises.

use crate::db::pool::Backend;
use crate::db::DynDatabasePool;
use crate::models::Note;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Column values for a new note
#[derive(Debug, Clone, Copy)]
pub struct NewNote<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub slug: &'a str,
    pub author_id: i64,
}

/// Note repository trait
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note
    async fn create(&self, note: NewNote<'_>) -> Result<Note>;

    /// Get note by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>>;

    /// All notes of one author, oldest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>>;

    /// Save title, text and slug of an existing note
    async fn update(&self, note: &Note) -> Result<Note>;

    /// Delete a note by ID
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a slug is used by any note other than `exclude_id`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Total number of notes
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based note repository for SQLite and MySQL
pub struct SqlxNoteRepository {
    pool: DynDatabasePool,
}

impl SqlxNoteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NoteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NoteRepository for SqlxNoteRepository {
    async fn create(&self, note: NewNote<'_>) -> Result<Note> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_note_sqlite(pool, note).await,
            Backend::Mysql(pool) => create_note_mysql(pool, note).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_note_by_slug_sqlite(pool, slug).await,
            Backend::Mysql(pool) => get_note_by_slug_mysql(pool, slug).await,
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_notes_by_author_sqlite(pool, author_id).await,
            Backend::Mysql(pool) => list_notes_by_author_mysql(pool, author_id).await,
        }
    }

    async fn update(&self, note: &Note) -> Result<Note> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_note_sqlite(pool, note).await,
            Backend::Mysql(pool) => update_note_mysql(pool, note).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM notes WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query("DELETE FROM notes WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete note")?;

        Ok(rows > 0)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        // -1 never matches an AUTOINCREMENT id
        let exclude_id = exclude_id.unwrap_or(-1);
        let sql = "SELECT COUNT(*) AS count FROM notes WHERE slug = ? AND id <> ?";
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
        }
        .context("Failed to check slug existence")?;

        Ok(count > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM notes";
        match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
            Backend::Mysql(pool) => sqlx::query(sql)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
        }
        .context("Failed to count notes")
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_note_sqlite(pool: &SqlitePool, note: NewNote<'_>) -> Result<Note> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO notes (title, text, slug, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(note.title)
    .bind(note.text)
    .bind(note.slug)
    .bind(note.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create note")?;

    Ok(Note {
        id: result.last_insert_rowid(),
        title: note.title.to_string(),
        text: note.text.to_string(),
        slug: note.slug.to_string(),
        author_id: note.author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn get_note_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Note>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, text, slug, author_id, created_at, updated_at
        FROM notes
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get note by slug")?;

    row.map(|row| row_to_note_sqlite(&row)).transpose()
}

async fn list_notes_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, slug, author_id, created_at, updated_at
        FROM notes
        WHERE author_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list notes")?;

    rows.iter().map(row_to_note_sqlite).collect()
}

async fn update_note_sqlite(pool: &SqlitePool, note: &Note) -> Result<Note> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE notes
        SET title = ?, text = ?, slug = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&note.title)
    .bind(&note.text)
    .bind(&note.slug)
    .bind(now)
    .bind(note.id)
    .execute(pool)
    .await
    .context("Failed to update note")?;

    Ok(Note {
        updated_at: now,
        ..note.clone()
    })
}

fn row_to_note_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        slug: row.try_get("slug")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_note_mysql(pool: &MySqlPool, note: NewNote<'_>) -> Result<Note> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO notes (title, text, slug, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(note.title)
    .bind(note.text)
    .bind(note.slug)
    .bind(note.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create note")?;

    Ok(Note {
        id: result.last_insert_id() as i64,
        title: note.title.to_string(),
        text: note.text.to_string(),
        slug: note.slug.to_string(),
        author_id: note.author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn get_note_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Note>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, text, slug, author_id, created_at, updated_at
        FROM notes
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get note by slug")?;

    row.map(|row| row_to_note_mysql(&row)).transpose()
}

async fn list_notes_by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, slug, author_id, created_at, updated_at
        FROM notes
        WHERE author_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list notes")?;

    rows.iter().map(row_to_note_mysql).collect()
}

async fn update_note_mysql(pool: &MySqlPool, note: &Note) -> Result<Note> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE notes
        SET title = ?, text = ?, slug = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&note.title)
    .bind(&note.text)
    .bind(&note.slug)
    .bind(now)
    .bind(note.id)
    .execute(pool)
    .await
    .context("Failed to update note")?;

    Ok(Note {
        updated_at: now,
        ..note.clone()
    })
}

fn row_to_note_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        slug: row.try_get("slug")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::is_unique_violation;
    use crate::db::repositories::test_support::{insert_user, setup_pool};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxNoteRepository) {
        let pool = setup_pool().await;
        let repo = SqlxNoteRepository::new(pool.clone());
        (pool, repo)
    }

    fn new_note(slug: &str, author_id: i64) -> NewNote<'_> {
        NewNote {
            title: "Заголовок",
            text: "Текст",
            slug,
            author_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;

        let created = repo.create(new_note("zagolovok", author.id)).await.expect("Failed to create");
        let found = repo
            .get_by_slug("zagolovok")
            .await
            .expect("Failed to query")
            .expect("Note should exist");

        assert_eq!(found.id, created.id);
        assert_eq!(found.title, "Заголовок");
        assert_eq!(found.author_id, author.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_author_only_returns_own_notes() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;
        let reader = insert_user(&pool, "reader").await;

        repo.create(new_note("a1", author.id)).await.unwrap();
        repo.create(new_note("r1", reader.id)).await.unwrap();
        repo.create(new_note("a2", author.id)).await.unwrap();

        let slugs: Vec<String> = repo
            .list_by_author(author.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.slug)
            .collect();
        assert_eq!(slugs, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_violates_unique_constraint() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;
        repo.create(new_note("same", author.id)).await.unwrap();

        let err = repo.create(new_note("same", author.id)).await.expect_err("Should fail");
        assert!(is_unique_violation(&err));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_note() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;
        let mut note = repo.create(new_note("old", author.id)).await.unwrap();

        note.title = "Новый".to_string();
        note.slug = "new".to_string();
        repo.update(&note).await.expect("Failed to update");

        assert!(repo.get_by_slug("old").await.unwrap().is_none());
        let stored = repo.get_by_slug("new").await.unwrap().expect("Note should exist");
        assert_eq!(stored.title, "Новый");
    }

    #[tokio::test]
    async fn test_slug_exists_with_exclusion() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;
        let note = repo.create(new_note("taken", author.id)).await.unwrap();

        assert!(repo.slug_exists("taken", None).await.unwrap());
        assert!(!repo.slug_exists("taken", Some(note.id)).await.unwrap());
        assert!(!repo.slug_exists("free", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_note() {
        let (pool, repo) = setup_test_repo().await;
        let author = insert_user(&pool, "author").await;
        let note = repo.create(new_note("gone", author.id)).await.unwrap();

        assert!(repo.delete(note.id).await.unwrap());
        assert!(!repo.delete(note.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
