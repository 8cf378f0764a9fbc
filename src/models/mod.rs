//! Data models
//!
//! Database entities (User, Session, Note, News, Comment) and the input
//! types the services accept.

mod comment;
mod news;
mod note;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor};
pub use news::{CreateNewsInput, News, NewsDetail};
pub use note::{Note, NoteInput};
pub use session::Session;
pub use user::{LoginInput, RegisterInput, User};
