//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login session; its id is the value of the `session` cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user_id` with a fresh random token
    pub fn start(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Seconds until expiry, clamped at zero (cookie `Max-Age`)
    pub fn max_age_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_generates_unique_tokens() {
        let a = Session::start(1, Duration::days(1));
        let b = Session::start(1, Duration::days(1));
        assert_ne!(a.id, b.id);
        assert!(!a.is_expired());
        assert!(a.max_age_seconds() > 0);
    }

    #[test]
    fn test_negative_lifetime_is_expired() {
        let session = Session::start(7, Duration::seconds(-5));
        assert!(session.is_expired());
        assert_eq!(session.max_age_seconds(), 0);
    }
}
