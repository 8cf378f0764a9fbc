//! News service
//!
//! Public news pages plus comments. Reading is open to everyone; writing a
//! comment needs a login, and only the comment's author may change or
//! remove it. Comment text passes the moderation filter on create and edit.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{Comment, CreateNewsInput, News, NewsDetail, User};
use crate::policy::access::authorize_found;
use crate::policy::{
    check_text, order_comments, order_news_for_home, require_login, AccessError, FieldError,
    ModerationFilter,
};
use anyhow::Context;
use std::sync::Arc;

/// Maximum news title length
pub const MAX_TITLE_LEN: usize = 50;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    /// No news item with this id
    #[error("News not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// News service
pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    moderation: ModerationFilter,
    home_page_count: usize,
}

impl NewsService {
    pub fn new(
        news_repo: Arc<dyn NewsRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        moderation: ModerationFilter,
        home_page_count: usize,
    ) -> Self {
        Self {
            news_repo,
            comment_repo,
            moderation,
            home_page_count,
        }
    }

    /// Newest news first, at most `home_page_count` items
    pub async fn home(&self) -> Result<Vec<News>, NewsServiceError> {
        let limit = i64::try_from(self.home_page_count).unwrap_or(i64::MAX);
        let news = self
            .news_repo
            .list_latest(limit)
            .await
            .context("Failed to list news")?;
        Ok(order_news_for_home(news, self.home_page_count))
    }

    /// A news item with its comments, oldest comment first
    pub async fn detail(&self, news_id: i64) -> Result<NewsDetail, NewsServiceError> {
        let news = self.get_news(news_id).await?;
        let comments = self
            .comment_repo
            .list_for_news(news_id)
            .await
            .context("Failed to list comments")?;

        Ok(NewsDetail {
            news,
            comments: order_comments(comments),
        })
    }

    /// Publish a news item
    pub async fn create_news(&self, input: &CreateNewsInput) -> Result<News, NewsServiceError> {
        let errors: Vec<FieldError> = [
            check_text("title", &input.title, Some(MAX_TITLE_LEN)),
            check_text("text", &input.text, None),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();
        if !errors.is_empty() {
            return Err(NewsServiceError::Validation(errors));
        }

        let news = self
            .news_repo
            .create(input)
            .await
            .context("Failed to create news")?;
        tracing::info!(news_id = news.id, date = %news.date, "News created");
        Ok(news)
    }

    /// Comment on a news item as the viewer
    pub async fn add_comment(
        &self,
        viewer: Option<&User>,
        news_id: i64,
        text: &str,
    ) -> Result<Comment, NewsServiceError> {
        let user = require_login(viewer)?;
        self.get_news(news_id).await?;
        self.moderate(text)?;

        let comment = self
            .comment_repo
            .create(news_id, user.id, text)
            .await
            .context("Failed to create comment")?;
        tracing::info!(comment_id = comment.id, news_id, author_id = user.id, "Comment added");
        Ok(comment)
    }

    /// One of the viewer's comments
    pub async fn get_comment(
        &self,
        viewer: Option<&User>,
        comment_id: i64,
    ) -> Result<Comment, NewsServiceError> {
        require_login(viewer)?;
        let comment = self
            .comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?;
        Ok(authorize_found(viewer, comment)?)
    }

    /// Replace the text of one of the viewer's comments
    pub async fn update_comment(
        &self,
        viewer: Option<&User>,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment, NewsServiceError> {
        let comment = self.get_comment(viewer, comment_id).await?;
        self.moderate(text)?;

        self.comment_repo
            .update_text(comment.id, text)
            .await
            .context("Failed to update comment")?;
        tracing::info!(comment_id = comment.id, "Comment updated");

        Ok(Comment {
            text: text.to_string(),
            ..comment
        })
    }

    /// Delete one of the viewer's comments, returning what was removed
    pub async fn delete_comment(
        &self,
        viewer: Option<&User>,
        comment_id: i64,
    ) -> Result<Comment, NewsServiceError> {
        let comment = self.get_comment(viewer, comment_id).await?;
        self.comment_repo
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        tracing::info!(comment_id = comment.id, news_id = comment.news_id, "Comment deleted");
        Ok(comment)
    }

    async fn get_news(&self, news_id: i64) -> Result<News, NewsServiceError> {
        self.news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news")?
            .ok_or(NewsServiceError::NotFound(news_id))
    }

    fn moderate(&self, text: &str) -> Result<(), NewsServiceError> {
        self.moderation
            .validate(text)
            .map_err(|e| NewsServiceError::Validation(vec![e]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::{SqlxCommentRepository, SqlxNewsRepository};
    use crate::db::DynDatabasePool;
    use chrono::{Duration, Utc};

    const HOME_PAGE_COUNT: usize = 10;

    async fn setup() -> (DynDatabasePool, NewsService, News) {
        let pool = setup_pool().await;
        let service = NewsService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            ModerationFilter::default(),
            HOME_PAGE_COUNT,
        );
        let news = service
            .create_news(&CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .expect("Failed to create news");
        (pool, service, news)
    }

    async fn comment_count(pool: &DynDatabasePool, news_id: i64) -> i64 {
        SqlxCommentRepository::new(pool.clone())
            .count_for_news(news_id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_home_is_capped_and_newest_first() {
        let (_pool, service, _) = setup().await;
        let today = Utc::now().date_naive();
        for i in 1..=HOME_PAGE_COUNT as i64 {
            let input = CreateNewsInput::new(format!("News {}", i), "Text").dated(today - Duration::days(i));
            service.create_news(&input).await.unwrap();
        }

        let home = service.home().await.unwrap();
        assert_eq!(home.len(), HOME_PAGE_COUNT);
        assert!(home.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(home[0].title, "Заголовок");
    }

    #[tokio::test]
    async fn test_detail_missing_news() {
        let (_pool, service, _) = setup().await;
        assert!(matches!(
            service.detail(9999).await,
            Err(NewsServiceError::NotFound(9999))
        ));
    }

    #[tokio::test]
    async fn test_add_comment_and_detail_order() {
        let (pool, service, news) = setup().await;
        let author = insert_user(&pool, "Автор").await;

        service.add_comment(Some(&author), news.id, "Text 0").await.unwrap();
        service.add_comment(Some(&author), news.id, "Text 1").await.unwrap();

        let detail = service.detail(news.id).await.unwrap();
        let texts: Vec<&str> = detail.comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["Text 0", "Text 1"]);
        assert_eq!(detail.comments[0].author_username, "Автор");
    }

    #[tokio::test]
    async fn test_anonymous_comment_rejected() {
        let (pool, service, news) = setup().await;

        let err = service.add_comment(None, news.id, "Привет").await.unwrap_err();
        assert!(matches!(err, NewsServiceError::Access(AccessError::Unauthenticated)));
        assert_eq!(comment_count(&pool, news.id).await, 0);
    }

    #[tokio::test]
    async fn test_bad_words_rejected() {
        let (pool, service, news) = setup().await;
        let author = insert_user(&pool, "author").await;

        let err = service
            .add_comment(Some(&author), news.id, "Какой-то текст, редиска, еще текст")
            .await
            .unwrap_err();
        match err {
            NewsServiceError::Validation(errors) => {
                assert_eq!(errors, vec![FieldError::new("text", "Не ругайтесь!")]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(comment_count(&pool, news.id).await, 0);
    }

    #[tokio::test]
    async fn test_comment_on_missing_news() {
        let (pool, service, _) = setup().await;
        let author = insert_user(&pool, "author").await;

        let err = service.add_comment(Some(&author), 9999, "Текст").await.unwrap_err();
        assert!(matches!(err, NewsServiceError::NotFound(9999)));
    }

    #[tokio::test]
    async fn test_author_can_edit_and_delete_comment() {
        let (pool, service, news) = setup().await;
        let author = insert_user(&pool, "author").await;
        let comment = service.add_comment(Some(&author), news.id, "Старый").await.unwrap();

        let updated = service
            .update_comment(Some(&author), comment.id, "Обновлённый комментарий")
            .await
            .unwrap();
        assert_eq!(updated.text, "Обновлённый комментарий");
        assert_eq!(updated.created.timestamp(), comment.created.timestamp());

        let deleted = service.delete_comment(Some(&author), comment.id).await.unwrap();
        assert_eq!(deleted.news_id, news.id);
        assert_eq!(comment_count(&pool, news.id).await, 0);
    }

    #[tokio::test]
    async fn test_other_user_gets_not_found() {
        let (pool, service, news) = setup().await;
        let author = insert_user(&pool, "author").await;
        let admin = insert_user(&pool, "admin").await;
        let comment = service.add_comment(Some(&author), news.id, "Мой").await.unwrap();

        let edit = service.update_comment(Some(&admin), comment.id, "Чужой").await;
        assert!(matches!(edit, Err(NewsServiceError::Access(AccessError::NotFound))));

        let delete = service.delete_comment(Some(&admin), comment.id).await;
        assert!(matches!(delete, Err(NewsServiceError::Access(AccessError::NotFound))));

        let stored = service.get_comment(Some(&author), comment.id).await.unwrap();
        assert_eq!(stored.text, "Мой");
    }

    #[tokio::test]
    async fn test_edit_runs_moderation() {
        let (pool, service, news) = setup().await;
        let author = insert_user(&pool, "author").await;
        let comment = service.add_comment(Some(&author), news.id, "Мирный").await.unwrap();

        let err = service
            .update_comment(Some(&author), comment.id, "ты негодяй")
            .await
            .unwrap_err();
        assert!(matches!(err, NewsServiceError::Validation(_)));
        assert_eq!(service.get_comment(Some(&author), comment.id).await.unwrap().text, "Мирный");
    }

    #[tokio::test]
    async fn test_create_news_validation() {
        let (_pool, service, _) = setup().await;
        let input = CreateNewsInput::new("x".repeat(MAX_TITLE_LEN + 1), " ");

        match service.create_news(&input).await.unwrap_err() {
            NewsServiceError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["title", "text"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
