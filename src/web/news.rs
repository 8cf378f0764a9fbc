//! News pages
//!
//! - GET  /news/                          - latest news
//! - GET  /news/{id}/                     - news with comments
//! - POST /news/{id}/                     - add a comment
//! - GET|POST /news/edit_comment/{id}/    - edit own comment
//! - GET|POST|DELETE /news/delete_comment/{id}/ - delete own comment

use axum::{
    extract::{Path, State},
    middleware as axum_middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use super::forms::{field_errors, parse_id, CommentForm};
use super::middleware::require_login_for_writes;
use super::{AppState, CurrentUser, WebError};
use crate::models::Comment;
use crate::policy::FieldError;
use crate::services::NewsServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news/", get(home))
        .route("/news/{id}/", get(detail).post(add_comment))
        .route(
            "/news/edit_comment/{id}/",
            get(edit_comment_form).post(edit_comment),
        )
        .route(
            "/news/delete_comment/{id}/",
            get(delete_comment_confirm)
                .post(delete_comment)
                .delete(delete_comment),
        )
        .route_layer(axum_middleware::from_fn(require_login_for_writes))
}

/// Where to go after touching a comment of news item `news_id`
fn comments_url(news_id: i64) -> String {
    format!("/news/{}/#comments", news_id)
}

async fn home(State(state): State<AppState>, viewer: CurrentUser) -> Result<Html<String>, WebError> {
    let news = state.news_service.home().await?;

    let mut context = TeraContext::new();
    context.insert("object_list", &news);
    state.render("news/home.html", &context, &viewer)
}

async fn detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;
    render_detail(&state, &viewer, id, &CommentForm::default(), &[]).await
}

async fn add_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;

    match state.news_service.add_comment(viewer.user(), id, &form.text).await {
        Ok(_) => Ok(Redirect::to(&comments_url(id)).into_response()),
        Err(NewsServiceError::Validation(errors)) => {
            Ok(render_detail(&state, &viewer, id, &form, &errors).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_comment_form(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;
    let comment = state.news_service.get_comment(viewer.user(), id).await?;

    let form = CommentForm {
        text: comment.text.clone(),
    };
    render_comment_page(&state, &viewer, "news/comment_edit.html", &comment, &form, &[])
}

async fn edit_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;

    match state.news_service.update_comment(viewer.user(), id, &form.text).await {
        Ok(comment) => Ok(Redirect::to(&comments_url(comment.news_id)).into_response()),
        Err(NewsServiceError::Validation(errors)) => {
            let comment = state.news_service.get_comment(viewer.user(), id).await?;
            Ok(render_comment_page(
                &state,
                &viewer,
                "news/comment_edit.html",
                &comment,
                &form,
                &errors,
            )?
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_comment_confirm(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;
    let comment = state.news_service.get_comment(viewer.user(), id).await?;
    render_comment_page(
        &state,
        &viewer,
        "news/comment_delete.html",
        &comment,
        &CommentForm::default(),
        &[],
    )
}

async fn delete_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, WebError> {
    let id = parse_id(&id).ok_or(WebError::NotFound)?;
    let comment = state.news_service.delete_comment(viewer.user(), id).await?;
    Ok(Redirect::to(&comments_url(comment.news_id)))
}

/// The detail page; the comment form is only offered to logged-in users
async fn render_detail(
    state: &AppState,
    viewer: &CurrentUser,
    news_id: i64,
    form: &CommentForm,
    errors: &[FieldError],
) -> Result<Html<String>, WebError> {
    let detail = state.news_service.detail(news_id).await?;

    let mut context = TeraContext::new();
    context.insert("news", &detail.news);
    context.insert("comments", &detail.comments);
    if viewer.user().is_some() {
        context.insert("form", form);
        context.insert("errors", &field_errors(errors));
    }
    state.render("news/detail.html", &context, viewer)
}

fn render_comment_page(
    state: &AppState,
    viewer: &CurrentUser,
    template: &str,
    comment: &Comment,
    form: &CommentForm,
    errors: &[FieldError],
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("comment", comment);
    context.insert("form", form);
    context.insert("errors", &field_errors(errors));
    state.render(template, &context, viewer)
}
