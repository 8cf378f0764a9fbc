//! News model

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::CommentWithAuthor;

/// A news item; read-only for site visitors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

/// Data for adding a news item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    /// Publication date; today (UTC) when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CreateNewsInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
        }
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// A news item with its comments in display order
#[derive(Debug, Clone, Serialize)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
}
