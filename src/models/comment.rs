//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Owned;

/// A comment on a news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Owned for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl AsRef<Comment> for Comment {
    fn as_ref(&self) -> &Comment {
        self
    }
}

/// Comment joined with its author's username, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
}

impl AsRef<Comment> for CommentWithAuthor {
    fn as_ref(&self) -> &Comment {
        &self.comment
    }
}

impl Owned for CommentWithAuthor {
    fn author_id(&self) -> i64 {
        self.comment.author_id
    }
}
