//! Error-to-response mapping for the HTML site
//!
//! Validation problems never reach this type: handlers re-render their form
//! with the field errors instead.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::policy::AccessError;
use crate::services::{NewsServiceError, NoteServiceError, UserServiceError};

/// Static body of the 404 page
pub const NOT_FOUND_PAGE: &str = include_str!("../../templates/404.html");

const INTERNAL_ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="utf-8"><title>Ошибка сервера</title></head>
<body><h1>500</h1><p>Внутренняя ошибка сервера.</p></body>
</html>"#;

/// Marker on a response that should become a redirect to the login page.
///
/// Handlers do not know the URL the user asked for in a form fit for
/// `next`; [`super::middleware::redirect_to_login`] does.
#[derive(Debug, Clone, Copy)]
pub struct LoginRequired;

/// Errors a page handler can end with
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Anonymous user on a login-only page
    #[error("authentication required")]
    Unauthenticated,

    /// Unknown route, missing resource, or someone else's resource
    #[error("not found")]
    NotFound,

    /// Malformed request that no form re-render can explain
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Unauthenticated => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response.extensions_mut().insert(LoginRequired);
                response
            }
            WebError::NotFound => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response(),
            WebError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            WebError::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(INTERNAL_ERROR_PAGE)).into_response()
            }
        }
    }
}

impl From<AccessError> for WebError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => WebError::Unauthenticated,
            AccessError::NotFound => WebError::NotFound,
        }
    }
}

impl From<NoteServiceError> for WebError {
    fn from(err: NoteServiceError) -> Self {
        match err {
            NoteServiceError::Access(e) => e.into(),
            NoteServiceError::Validation(errors) => WebError::BadRequest(format!("{:?}", errors)),
            NoteServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<NewsServiceError> for WebError {
    fn from(err: NewsServiceError) -> Self {
        match err {
            NewsServiceError::NotFound(_) => WebError::NotFound,
            NewsServiceError::Access(e) => e.into(),
            NewsServiceError::Validation(errors) => WebError::BadRequest(format!("{:?}", errors)),
            NewsServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<UserServiceError> for WebError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(message) => WebError::BadRequest(message),
            UserServiceError::Validation(errors) => WebError::BadRequest(format!("{:?}", errors)),
            UserServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}
