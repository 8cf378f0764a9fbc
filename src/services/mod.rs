//! Services layer - Business logic
//!
//! Services combine repositories with the policies in [`crate::policy`]:
//! - enforce login and ownership before reads and writes
//! - validate forms and return per-field errors
//! - log every successful mutation

pub mod news;
pub mod note;
pub mod password;
pub mod user;

pub use news::{NewsService, NewsServiceError};
pub use note::{NoteService, NoteServiceError};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};
