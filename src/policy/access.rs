//! Ownership-based access control for notes and comments
//!
//! Only the author may view (notes), edit or delete their content. Anonymous
//! users are told to log in; everybody else is told the resource does not
//! exist, so foreign content is indistinguishable from missing content.
//! There is no administrator bypass.

use crate::models::User;

/// Content that belongs to exactly one user
pub trait Owned {
    fn author_id(&self) -> i64;
}

impl<T: Owned + ?Sized> Owned for &T {
    fn author_id(&self) -> i64 {
        (**self).author_id()
    }
}

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// No logged-in user; the caller should redirect to the login page
    #[error("authentication required")]
    Unauthenticated,
    /// Missing, or owned by someone else
    #[error("not found")]
    NotFound,
}

/// True iff `user` is logged in and is the author of `resource`.
pub fn can_mutate<R: Owned + ?Sized>(user: Option<&User>, resource: &R) -> bool {
    user.map_or(false, |user| user.id == resource.author_id())
}

/// Return the logged-in user or `Unauthenticated`.
pub fn require_login(user: Option<&User>) -> Result<&User, AccessError> {
    user.ok_or(AccessError::Unauthenticated)
}

/// Hand `resource` back if `user` owns it.
pub fn authorize<R: Owned>(user: Option<&User>, resource: R) -> Result<R, AccessError> {
    let user = require_login(user)?;
    if can_mutate(Some(user), &resource) {
        Ok(resource)
    } else {
        tracing::debug!(
            user_id = user.id,
            author_id = resource.author_id(),
            "Access to foreign resource refused"
        );
        Err(AccessError::NotFound)
    }
}

/// Like [`authorize`] for a lookup that may have found nothing.
///
/// Callers check login with [`require_login`] before the lookup, so this
/// only distinguishes "mine" from "missing or not mine".
pub fn authorize_found<R: Owned>(user: Option<&User>, resource: Option<R>) -> Result<R, AccessError> {
    require_login(user)?;
    match resource {
        Some(resource) => authorize(user, resource),
        None => Err(AccessError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    struct Doc {
        author: i64,
    }

    impl Owned for Doc {
        fn author_id(&self) -> i64 {
            self.author
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_author_may_mutate() {
        let author = user(1);
        assert!(can_mutate(Some(&author), &Doc { author: 1 }));
    }

    #[test]
    fn test_anonymous_may_not_mutate() {
        assert!(!can_mutate(None, &Doc { author: 1 }));
        assert_eq!(
            authorize(None, Doc { author: 1 }).err(),
            Some(AccessError::Unauthenticated)
        );
    }

    #[test]
    fn test_other_user_gets_not_found() {
        let reader = user(2);
        assert!(!can_mutate(Some(&reader), &Doc { author: 1 }));
        assert_eq!(
            authorize(Some(&reader), Doc { author: 1 }).err(),
            Some(AccessError::NotFound)
        );
    }

    #[test]
    fn test_authorize_found() {
        let author = user(1);
        assert!(authorize_found(Some(&author), Some(Doc { author: 1 })).is_ok());
        assert_eq!(
            authorize_found::<Doc>(Some(&author), None).err(),
            Some(AccessError::NotFound)
        );
        assert_eq!(
            authorize_found::<Doc>(None, None).err(),
            Some(AccessError::Unauthenticated)
        );
    }

    #[test]
    fn test_reference_is_owned() {
        let doc = Doc { author: 3 };
        assert_eq!((&doc).author_id(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn non_author_never_mutates(user_id in 1i64..1000, author in 1i64..1000) {
            prop_assume!(user_id != author);
            let current = user(user_id);
            let doc = Doc { author };
            prop_assert!(!can_mutate(Some(&current), &doc));
            prop_assert_eq!(authorize(Some(&current), doc).err(), Some(AccessError::NotFound));
        }

        #[test]
        fn author_always_mutates(id in 1i64..1000) {
            let current = user(id);
            let doc = Doc { author: id };
            prop_assert!(can_mutate(Some(&current), &doc));
        }
    }
}
