//! Shared fixtures for the HTTP tests
//!
//! Every [`TestApp`] runs the real router against its own in-memory SQLite
//! database. Users are inserted with a placeholder hash and logged in by
//! opening a session directly, so no test pays for password hashing.

#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono::NaiveDate;

use notenews::config::Config;
use notenews::db::migrations::run_migrations;
use notenews::db::repositories::{
    CommentRepository, NewsRepository, NoteRepository, SqlxCommentRepository, SqlxNewsRepository,
    SqlxNoteRepository, SqlxUserRepository, UserRepository,
};
use notenews::db::{create_test_pool, DynDatabasePool};
use notenews::models::{Comment, CreateNewsInput, News, User};
use notenews::web::{build_router, AppState};

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub pool: DynDatabasePool,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let pool = create_test_pool().await.expect("test pool");
        run_migrations(&pool).await.expect("migrations");
        let state = AppState::from_config(&config, pool.clone()).expect("app state");
        let server = TestServer::new(build_router(state.clone())).expect("test server");
        Self {
            server,
            state,
            pool,
        }
    }

    pub async fn create_user(&self, username: &str) -> User {
        SqlxUserRepository::new(self.pool.clone())
            .create(username, "not-a-real-hash")
            .await
            .expect("create user")
    }

    /// `Cookie` header carrying a fresh session for `user`
    pub async fn login(&self, user: &User) -> (HeaderName, HeaderValue) {
        let session = self
            .state
            .user_service
            .start_session(user.id)
            .await
            .expect("start session");
        let cookie = HeaderValue::from_str(&format!("session={}", session.id)).expect("cookie");
        (header::COOKIE, cookie)
    }

    pub async fn create_news(&self, title: &str, date: NaiveDate) -> News {
        SqlxNewsRepository::new(self.pool.clone())
            .create(&CreateNewsInput::new(title, format!("{} text", title)).dated(date))
            .await
            .expect("create news")
    }

    pub async fn create_comment(&self, news: &News, author: &User, text: &str) -> Comment {
        SqlxCommentRepository::new(self.pool.clone())
            .create(news.id, author.id, text)
            .await
            .expect("create comment")
    }

    pub async fn get_comment(&self, id: i64) -> Option<Comment> {
        SqlxCommentRepository::new(self.pool.clone())
            .get_by_id(id)
            .await
            .expect("get comment")
    }

    pub async fn comment_count(&self, news: &News) -> i64 {
        SqlxCommentRepository::new(self.pool.clone())
            .count_for_news(news.id)
            .await
            .expect("count comments")
    }

    pub async fn note_count(&self) -> i64 {
        SqlxNoteRepository::new(self.pool.clone())
            .count()
            .await
            .expect("count notes")
    }

    pub async fn get_note(&self, slug: &str) -> Option<notenews::models::Note> {
        SqlxNoteRepository::new(self.pool.clone())
            .get_by_slug(slug)
            .await
            .expect("get note")
    }

    /// GET `path`, logged in as `user` when given
    pub async fn get_as(&self, path: &str, user: Option<&User>) -> axum_test::TestResponse {
        self.as_user(self.server.get(path), user).await.await
    }

    /// POST a form to `path`, logged in as `user` when given
    pub async fn post_as(
        &self,
        path: &str,
        user: Option<&User>,
        form: &[(&str, &str)],
    ) -> axum_test::TestResponse {
        self.as_user(self.server.post(path).form(&form), user)
            .await
            .await
    }

    async fn as_user(&self, request: TestRequest, user: Option<&User>) -> TestRequest {
        match user {
            Some(user) => {
                let (name, value) = self.login(user).await;
                request.add_header(name, value)
            }
            None => request,
        }
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// `Location` header of a redirect
pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("ascii location")
        .to_string()
}
