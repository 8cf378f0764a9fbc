//! User service
//!
//! Account registration, login/logout and session lookup. Sessions are
//! rows in the `sessions` table keyed by a random token that the web layer
//! stores in the `session` cookie.

use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{LoginInput, RegisterInput, Session, User};
use crate::policy::FieldError;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_USERNAME_MESSAGE: &str = "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_.";
const DUPLICATE_USERNAME_MESSAGE: &str = "Пользователь с таким именем уже существует.";
const PASSWORD_MISMATCH_MESSAGE: &str = "Введенные пароли не совпадают.";
const INVALID_LOGIN_MESSAGE: &str = "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";

static USERNAME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown username or wrong password
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Sign-up form rejected
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_lifetime: Duration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a user service with a custom session lifetime
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_lifetime: Duration::days(session_expiration_days),
        }
    }

    /// Register a new account.
    ///
    /// All field problems are collected and returned together as
    /// `Validation`, in form order (username, password1, password2).
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let mut errors = validate_register_input(&input);
        let username = input.username.trim();

        if errors.iter().all(|e| e.field != "username")
            && self
                .user_repo
                .exists_by_username(username)
                .await
                .context("Failed to check username")?
        {
            errors.insert(0, FieldError::new("username", DUPLICATE_USERNAME_MESSAGE));
        }

        if !errors.is_empty() {
            return Err(UserServiceError::Validation(errors));
        }

        let password_hash = hash_password(&input.password1).context("Failed to hash password")?;

        let user = match self.user_repo.create(username, &password_hash).await {
            Ok(user) => user,
            // Lost a race with a concurrent sign-up for the same name
            Err(e) if is_unique_violation(&e) => {
                return Err(UserServiceError::Validation(vec![FieldError::new(
                    "username",
                    DUPLICATE_USERNAME_MESSAGE,
                )]));
            }
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to look up user")?;

        let Some(user) = user else {
            tracing::debug!(username = %input.username, "Login failed: unknown user");
            return Err(UserServiceError::AuthenticationError(
                INVALID_LOGIN_MESSAGE.to_string(),
            ));
        };

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::debug!(user_id = user.id, "Login failed: wrong password");
            return Err(UserServiceError::AuthenticationError(
                INVALID_LOGIN_MESSAGE.to_string(),
            ));
        }

        let session = self.start_session(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, session))
    }

    /// Store a new session for `user_id`
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::start(user_id, self.session_lifetime);
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(session)
    }

    /// Invalidate a session; unknown tokens are ignored
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        tracing::debug!("Session closed");
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Unknown and expired tokens yield `None`; an expired session is
    /// deleted on the way.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }
}

fn validate_register_input(input: &RegisterInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let username = input.username.trim();
    let username_len = username.chars().count();
    if username.is_empty() {
        errors.push(FieldError::required("username"));
    } else if username_len > MAX_USERNAME_LEN {
        errors.push(FieldError::too_long("username", MAX_USERNAME_LEN, username_len));
    } else if !USERNAME_FORMAT.is_match(username) {
        errors.push(FieldError::new("username", INVALID_USERNAME_MESSAGE));
    }

    if input.password1.is_empty() {
        errors.push(FieldError::required("password1"));
    } else if input.password1.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password1",
            format!(
                "Введённый пароль слишком короткий. Он должен содержать как минимум {} символов.",
                MIN_PASSWORD_LEN
            ),
        ));
    }

    if input.password2.is_empty() {
        errors.push(FieldError::required("password2"));
    } else if !input.password1.is_empty() && input.password1 != input.password2 {
        errors.push(FieldError::new("password2", PASSWORD_MISMATCH_MESSAGE));
    }

    errors
}
