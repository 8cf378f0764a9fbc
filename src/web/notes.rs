//! Notes pages
//!
//! - GET  /notes/                 - home (public)
//! - GET  /notes/list/            - the user's notes
//! - GET|POST /notes/add/         - create form
//! - GET  /notes/done/            - success page
//! - GET  /notes/note/{slug}/     - detail (author only)
//! - GET|POST /notes/edit/{slug}/ - edit form (author only)
//! - GET|POST /notes/delete/{slug}/ - delete confirmation (author only)

use axum::{
    extract::{Path, State},
    middleware as axum_middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use super::forms::field_errors;
use super::middleware::require_login_for_writes;
use super::{AppState, CurrentUser, WebError};
use crate::models::NoteInput;
use crate::policy::{require_login, FieldError};
use crate::services::NoteServiceError;

const DONE_URL: &str = "/notes/done/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes/", get(home))
        .route("/notes/list/", get(list))
        .route("/notes/add/", get(add_form).post(add))
        .route("/notes/done/", get(done))
        .route("/notes/note/{slug}/", get(detail))
        .route("/notes/edit/{slug}/", get(edit_form).post(edit))
        .route("/notes/delete/{slug}/", get(delete_confirm).post(delete))
        .route_layer(axum_middleware::from_fn(require_login_for_writes))
}

async fn home(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    state.render("notes/home.html", &TeraContext::new(), &viewer)
}

async fn list(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    let notes = state.note_service.list(viewer.user()).await?;

    let mut context = TeraContext::new();
    context.insert("object_list", &notes);
    state.render("notes/list.html", &context, &viewer)
}

async fn add_form(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    require_login(viewer.user())?;
    render_form(&state, &viewer, &NoteInput::default(), &[], false)
}

async fn add(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Form(input): Form<NoteInput>,
) -> Result<Response, WebError> {
    match state.note_service.create(viewer.user(), &input).await {
        Ok(_) => Ok(Redirect::to(DONE_URL).into_response()),
        Err(NoteServiceError::Validation(errors)) => {
            Ok(render_form(&state, &viewer, &input, &errors, false)?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn done(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    require_login(viewer.user())?;
    state.render("notes/success.html", &TeraContext::new(), &viewer)
}

async fn detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Html<String>, WebError> {
    let note = state.note_service.get(viewer.user(), &slug).await?;

    let mut context = TeraContext::new();
    context.insert("note", &note);
    state.render("notes/detail.html", &context, &viewer)
}

async fn edit_form(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Html<String>, WebError> {
    let note = state.note_service.get(viewer.user(), &slug).await?;
    render_form(&state, &viewer, &NoteInput::from(&note), &[], true)
}

async fn edit(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(slug): Path<String>,
    Form(input): Form<NoteInput>,
) -> Result<Response, WebError> {
    match state.note_service.update(viewer.user(), &slug, &input).await {
        Ok(_) => Ok(Redirect::to(DONE_URL).into_response()),
        Err(NoteServiceError::Validation(errors)) => {
            Ok(render_form(&state, &viewer, &input, &errors, true)?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_confirm(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Html<String>, WebError> {
    let note = state.note_service.get(viewer.user(), &slug).await?;

    let mut context = TeraContext::new();
    context.insert("note", &note);
    state.render("notes/delete.html", &context, &viewer)
}

async fn delete(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Redirect, WebError> {
    state.note_service.delete(viewer.user(), &slug).await?;
    Ok(Redirect::to(DONE_URL))
}

fn render_form(
    state: &AppState,
    viewer: &CurrentUser,
    form: &NoteInput,
    errors: &[FieldError],
    is_edit: bool,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", &field_errors(errors));
    context.insert("is_edit", &is_edit);
    state.render("notes/form.html", &context, viewer)
}
