//! Content policies
//!
//! Pure decision functions shared by the notes and news services:
//! - [`access`]: who may view, edit and delete owned content
//! - [`ordering`]: news and comment display order
//! - [`slug`]: note slug derivation and validation
//! - [`moderation`]: forbidden-word filter for comments
//!
//! None of these touch the database; callers feed them the facts they need
//! (the current user, the loaded resource, whether a slug is taken).

pub mod access;
pub mod moderation;
pub mod ordering;
pub mod slug;

use serde::Serialize;

pub use access::{authorize, can_mutate, require_login, AccessError, Owned};
pub use moderation::ModerationFilter;
pub use ordering::{order_comments, order_news_for_home};
pub use slug::{derive_slug, slugify};

/// "This field is required."
pub const REQUIRED_MESSAGE: &str = "Обязательное поле.";

/// A validation failure attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, REQUIRED_MESSAGE)
    }

    /// "Make sure this value has at most N characters."
    pub fn too_long(field: &'static str, max: usize, actual: usize) -> Self {
        Self::new(
            field,
            format!(
                "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
                max, actual
            ),
        )
    }
}

/// Check a required text field: non-blank and at most `max` characters.
pub fn check_text(field: &'static str, value: &str, max: Option<usize>) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::required(field));
    }
    if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            return Err(FieldError::too_long(field, max, len));
        }
    }
    Ok(())
}
