//! Display order for news and comments
//!
//! News: newest date first, capped at the home page size. Comments: oldest
//! first. Ties fall back to the id so the order is total.

use crate::models::{Comment, News};

/// Newest first, at most `limit` items.
pub fn order_news_for_home(mut news: Vec<News>, limit: usize) -> Vec<News> {
    news.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
    news.truncate(limit);
    news
}

/// Oldest first.
pub fn order_comments<C: AsRef<Comment>>(mut comments: Vec<C>) -> Vec<C> {
    comments.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        a.created.cmp(&b.created).then(a.id.cmp(&b.id))
    });
    comments
}
