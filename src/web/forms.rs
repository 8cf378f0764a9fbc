//! Form payloads and helpers shared by the page handlers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::policy::FieldError;

/// Field name to messages, as the templates expect under `errors`
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

pub fn field_errors(errors: &[FieldError]) -> FieldErrors {
    let mut by_field = FieldErrors::new();
    for error in errors {
        by_field
            .entry(error.field)
            .or_default()
            .push(error.message.clone());
    }
    by_field
}

/// Comment create/edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Login form; `next` comes from a hidden field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// `?next=` on the login page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Only local absolute paths are followed after login; anything else
/// (other hosts, `//host`, backslash tricks) is dropped.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|next| {
        next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
    })
}

/// Parse a numeric path id; anything else is an unknown page
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}
