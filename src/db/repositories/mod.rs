//! Database repositories
//!
//! One repository trait per entity plus its SQLx implementation for SQLite
//! and MySQL.

pub mod comment;
pub mod news;
pub mod note;
pub mod session;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use note::{NoteRepository, SqlxNoteRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
