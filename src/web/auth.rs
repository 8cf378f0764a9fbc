//! Account pages
//!
//! - GET|POST /auth/signup/  - registration
//! - GET|POST /auth/login/   - login, sets the session cookie
//! - GET|POST /auth/logout/  - logout, clears the session cookie

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use super::forms::{field_errors, safe_next, LoginForm, NextQuery};
use super::middleware::{clear_session_cookie, session_cookie, session_token};
use super::{AppState, CurrentUser, WebError};
use crate::models::{LoginInput, RegisterInput};
use crate::policy::FieldError;
use crate::services::UserServiceError;

/// Where a successful login goes without a usable `next`
const DEFAULT_LOGIN_REDIRECT: &str = "/news/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout).post(logout))
}

async fn signup_form(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    render_signup(&state, &viewer, "", &[])
}

async fn signup(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Form(input): Form<RegisterInput>,
) -> Result<Response, WebError> {
    let username = input.username.clone();
    match state.user_service.register(input).await {
        Ok(_) => Ok(Redirect::to("/auth/login/").into_response()),
        Err(UserServiceError::Validation(errors)) => {
            Ok(render_signup(&state, &viewer, &username, &errors)?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_form(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>, WebError> {
    let next = safe_next(query.next.as_deref()).unwrap_or_default();
    render_login(&state, &viewer, "", next, None)
}

async fn login(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let next = safe_next(form.next.as_deref())
        .or_else(|| safe_next(query.next.as_deref()))
        .map(str::to_string);

    let input = LoginInput::new(form.username.clone(), form.password);
    let (user, session) = match state.user_service.login(input).await {
        Ok(logged_in) => logged_in,
        Err(UserServiceError::AuthenticationError(message)) => {
            let next = next.as_deref().unwrap_or_default();
            return Ok(render_login(&state, &viewer, &form.username, next, Some(message.as_str()))?
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = session_cookie(&session.id, session.max_age_seconds());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| WebError::Internal(anyhow::anyhow!("Invalid session cookie: {}", e)))?,
    );

    tracing::debug!(user_id = user.id, "Session cookie issued");
    let target = next.unwrap_or_else(|| DEFAULT_LOGIN_REDIRECT.to_string());
    Ok((headers, Redirect::to(&target)).into_response())
}

async fn logout(
    State(state): State<AppState>,
    viewer: CurrentUser,
    request_headers: HeaderMap,
) -> Result<Response, WebError> {
    if let Some(token) = session_token(&request_headers) {
        state.user_service.logout(token).await?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&clear_session_cookie())
            .map_err(|e| WebError::Internal(anyhow::anyhow!("Invalid session cookie: {}", e)))?,
    );

    // The page itself is rendered for an anonymous visitor
    let anonymous = CurrentUser {
        user: None,
        path: viewer.path,
    };
    let page = state.render("auth/logged_out.html", &TeraContext::new(), &anonymous)?;
    Ok((headers, page).into_response())
}

fn render_signup(
    state: &AppState,
    viewer: &CurrentUser,
    username: &str,
    errors: &[FieldError],
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", &serde_json::json!({ "username": username }));
    context.insert("errors", &field_errors(errors));
    state.render("auth/signup.html", &context, viewer)
}

fn render_login(
    state: &AppState,
    viewer: &CurrentUser,
    username: &str,
    next: &str,
    error: Option<&str>,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", &serde_json::json!({ "username": username }));
    context.insert("next", next);
    context.insert("error", &error);
    state.render("auth/login.html", &context, viewer)
}
