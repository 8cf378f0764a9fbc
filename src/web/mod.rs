//! Web layer - HTML pages and routing
//!
//! Server-rendered pages for the three parts of the site:
//! - `/notes/…` personal notes
//! - `/news/…` news with comments
//! - `/auth/…` sign-up, login, logout
//!
//! Handlers return `Result<_, WebError>`. Login-only pages fail with
//! `WebError::Unauthenticated`, which the `redirect_to_login` middleware
//! turns into a redirect to `/auth/login/?next=<path>`.

pub mod auth;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod news;
pub mod notes;

use anyhow::Result;
use axum::{
    middleware as axum_middleware,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use std::sync::Arc;
use tera::Context as TeraContext;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxNoteRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::policy::ModerationFilter;
use crate::services::{NewsService, NoteService, UserService};
use crate::templates::TemplateEngine;

pub use error::WebError;
pub use middleware::CurrentUser;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub note_service: Arc<NoteService>,
    pub news_service: Arc<NewsService>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Wire repositories, services and templates from configuration
    pub fn from_config(config: &Config, pool: DynDatabasePool) -> Result<Self> {
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.session.expiration_days,
        );
        let note_service = NoteService::new(SqlxNoteRepository::boxed(pool.clone()));
        let news_service = NewsService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            ModerationFilter::from_config(&config.moderation),
            config.news.home_page_count,
        );
        let templates = TemplateEngine::new(config.templates.path.as_deref())?;

        Ok(Self {
            pool,
            user_service: Arc::new(user_service),
            note_service: Arc::new(note_service),
            news_service: Arc::new(news_service),
            templates: Arc::new(templates),
        })
    }

    /// Render a page for `viewer`
    pub fn render(
        &self,
        template: &str,
        context: &TeraContext,
        viewer: &CurrentUser,
    ) -> Result<Html<String>, WebError> {
        let html = self
            .templates
            .render_page(template, context, &viewer.page_vars())?;
        Ok(Html(html))
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/news/") }))
        .merge(notes::router())
        .merge(news::router())
        .merge(auth::router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::load_session,
                ))
                .layer(axum_middleware::from_fn(middleware::redirect_to_login)),
        )
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound
}
