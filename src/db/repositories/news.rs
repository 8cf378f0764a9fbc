//! News repository
//!
//! News items are created by operators (see the `import-news` binary) and
//! read by the public news pages.

use crate::db::pool::Backend;
use crate::db::DynDatabasePool;
use crate::models::{CreateNewsInput, News};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert a news item; a missing date means today
    async fn create(&self, input: &CreateNewsInput) -> Result<News>;

    /// Get news item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Newest items first, ties broken by ascending id
    async fn list_latest(&self, limit: i64) -> Result<Vec<News>>;

    /// Total number of news items
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository for SQLite and MySQL
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<News> {
        let date = input.date_or_today();
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
                .bind(&input.title)
                .bind(&input.text)
                .bind(date)
                .execute(pool)
                .await
                .map(|r| r.last_insert_rowid()),
            Backend::Mysql(pool) => sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
                .bind(&input.title)
                .bind(&input.text)
                .bind(date)
                .execute(pool)
                .await
                .map(|r| r.last_insert_id() as i64),
        }
        .context("Failed to create news")?;

        Ok(News {
            id,
            title: input.title.clone(),
            text: input.text.clone(),
            date,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_news_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_news_by_id_mysql(pool, id).await,
        }
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<News>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_latest_news_sqlite(pool, limit).await,
            Backend::Mysql(pool) => list_latest_news_mysql(pool, limit).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM news";
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
        .context("Failed to count news")
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    row.map(|row| row_to_news_sqlite(&row)).transpose()
}

async fn list_latest_news_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<News>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, date
        FROM news
        ORDER BY date DESC, id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list news")?;

    rows.iter().map(row_to_news_sqlite).collect()
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        date: row.try_get("date")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    row.map(|row| row_to_news_mysql(&row)).transpose()
}

async fn list_latest_news_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<News>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, text, date
        FROM news
        ORDER BY date DESC, id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list news")?;

    rows.iter().map(row_to_news_mysql).collect()
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        date: row.try_get("date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use chrono::NaiveDate;

    async fn setup_test_repo() -> SqlxNewsRepository {
        SqlxNewsRepository::new(setup_pool().await)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_news() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&CreateNewsInput::new("Новость", "Текст").dated(day(5)))
            .await
            .expect("Failed to create news");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to query")
            .expect("News should exist");
        assert_eq!(found, created);
        assert_eq!(found.date, day(5));
    }

    #[tokio::test]
    async fn test_create_without_date_uses_today() {
        let repo = setup_test_repo().await;
        let created = repo.create(&CreateNewsInput::new("Сегодня", "Текст")).await.unwrap();
        assert_eq!(created.date, chrono::Utc::now().date_naive());
    }

    #[tokio::test]
    async fn test_get_missing_news() {
        let repo = setup_test_repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_latest_order_and_limit() {
        let repo = setup_test_repo().await;
        let old = repo.create(&CreateNewsInput::new("old", "t").dated(day(1))).await.unwrap();
        let new_a = repo.create(&CreateNewsInput::new("new a", "t").dated(day(9))).await.unwrap();
        let mid = repo.create(&CreateNewsInput::new("mid", "t").dated(day(4))).await.unwrap();
        let new_b = repo.create(&CreateNewsInput::new("new b", "t").dated(day(9))).await.unwrap();

        let ids: Vec<i64> = repo.list_latest(10).await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![new_a.id, new_b.id, mid.id, old.id]);

        let top: Vec<i64> = repo.list_latest(2).await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(top, vec![new_a.id, new_b.id]);
        assert_eq!(repo.count().await.unwrap(), 4);
    }
}
