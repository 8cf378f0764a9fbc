//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::db::pool::Backend;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment, stamped with the current time
    async fn create(&self, news_id: i64, author_id: i64, text: &str) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a news item with author names, oldest first
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace the text of a comment; `created` is left untouched
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of comments on a news item
    async fn count_for_news(&self, news_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository for SQLite and MySQL
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, news_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_comment_sqlite(pool, news_id, author_id, text).await,
            Backend::Mysql(pool) => create_comment_mysql(pool, news_id, author_id, text).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_comment_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_comment_by_id_mysql(pool, id).await,
        }
    }

    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_comments_for_news_sqlite(pool, news_id).await,
            Backend::Mysql(pool) => list_comments_for_news_mysql(pool, news_id).await,
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let sql = "UPDATE comments SET text = ? WHERE id = ?";
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to update comment")?;

        Ok(rows > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM comments WHERE id = ?";
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete comment")?;

        Ok(rows > 0)
    }

    async fn count_for_news(&self, news_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM comments WHERE news_id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(news_id)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(news_id)
                .fetch_one(pool)
                .await
                .and_then(|row| row.try_get("count")),
        }
        .context("Failed to count comments")
    }
}

const SELECT_WITH_AUTHOR: &str = r#"
    SELECT c.id, c.news_id, c.author_id, c.text, c.created, u.username AS author_username
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.news_id = ?
    ORDER BY c.created ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    news_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment> {
    let created = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)",
    )
    .bind(news_id)
    .bind(author_id)
    .bind(text)
    .bind(created)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        news_id,
        author_id,
        text: text.to_string(),
        created,
    })
}

async fn get_comment_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.map(|row| row_to_comment_sqlite(&row)).transpose()
}

async fn list_comments_for_news_sqlite(
    pool: &SqlitePool,
    news_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(SELECT_WITH_AUTHOR)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    rows.iter()
        .map(|row| {
            Ok(CommentWithAuthor {
                comment: row_to_comment_sqlite(row)?,
                author_username: row.try_get("author_username")?,
            })
        })
        .collect()
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        news_id: row.try_get("news_id")?,
        author_id: row.try_get("author_id")?,
        text: row.try_get("text")?,
        created: row.try_get("created")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    news_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment> {
    let created = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)",
    )
    .bind(news_id)
    .bind(author_id)
    .bind(text)
    .bind(created)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        news_id,
        author_id,
        text: text.to_string(),
        created,
    })
}

async fn get_comment_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.map(|row| row_to_comment_mysql(&row)).transpose()
}

async fn list_comments_for_news_mysql(
    pool: &MySqlPool,
    news_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(SELECT_WITH_AUTHOR)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    rows.iter()
        .map(|row| {
            Ok(CommentWithAuthor {
                comment: row_to_comment_mysql(row)?,
                author_username: row.try_get("author_username")?,
            })
        })
        .collect()
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        news_id: row.try_get("news_id")?,
        author_id: row.try_get("author_id")?,
        text: row.try_get("text")?,
        created: row.try_get("created")?,
    })
}
