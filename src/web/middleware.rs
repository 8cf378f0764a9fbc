//! Request middleware
//!
//! - [`load_session`] resolves the `session` cookie to a [`CurrentUser`]
//! - [`redirect_to_login`] turns [`WebError::Unauthenticated`] responses
//!   into a redirect to the login page that remembers where the user was

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;

use super::error::{LoginRequired, WebError};
use super::AppState;
use crate::models::User;
use crate::templates::PageVars;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// The visitor behind a request, plus the path they asked for
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub user: Option<User>,
    /// Request path and query, e.g. `/notes/add/`
    pub path: String,
}

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Template variables for this visitor
    pub fn page_vars(&self) -> PageVars {
        PageVars::new(self.user.clone(), self.path.clone())
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_else(|| CurrentUser {
                user: None,
                path: parts.uri.path().to_string(),
            }))
    }
}

/// Session token from the `session` cookie
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Login page URL that sends the user back to `next` afterwards.
///
/// `next` is percent-encoded except for `/`, so `/notes/add/` stays
/// readable.
pub fn login_url(next: &str) -> String {
    format!(
        "/auth/login/?next={}",
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// Attach the current user (if any) to every request
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let user = match session_token(request.headers()) {
        Some(token) => state.user_service.validate_session(token).await?,
        None => None,
    };

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    request.extensions_mut().insert(CurrentUser { user, path });
    Ok(next.run(request).await)
}

/// Turn away anonymous writes before the handler reads the body.
///
/// Every POST and DELETE under `/notes/` and `/news/` needs a user, and a
/// form extractor would otherwise reject an odd body before the login
/// check had a chance to run.
pub async fn require_login_for_writes(
    viewer: CurrentUser,
    request: Request,
    next: Next,
) -> Response {
    let read_only = matches!(*request.method(), Method::GET | Method::HEAD);
    if !read_only && viewer.user.is_none() {
        return WebError::Unauthenticated.into_response();
    }
    next.run(request).await
}

/// Replace "login required" responses with a redirect to the login page
pub async fn redirect_to_login(request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let response = next.run(request).await;
    if response.extensions().get::<LoginRequired>().is_some() {
        tracing::debug!(next = %target, "Anonymous request sent to login");
        return Redirect::to(&login_url(&target)).into_response();
    }
    response
}
