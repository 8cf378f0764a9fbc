//! Template engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template file could not be read or decoded
    #[error("Failed to load template {name}: {reason}")]
    Load { name: String, reason: String },

    /// Tera rejected a template or failed to render it
    #[error("Template error: {0}")]
    Render(String),

    /// IO error while scanning the override directory
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
