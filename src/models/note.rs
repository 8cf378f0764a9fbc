//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Owned;

/// A personal note, visible and editable only by its author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// URL identifier, unique across all notes
    pub slug: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Note {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Note form data for create and edit
///
/// An empty `slug` means "derive it from the title".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            slug: String::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// The slug the user typed, if any
    pub fn supplied_slug(&self) -> Option<&str> {
        let slug = self.slug.trim();
        (!slug.is_empty()).then_some(slug)
    }
}

impl From<&Note> for NoteInput {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }
}
