//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// Longest accepted username, counted in characters after normalization
pub const MAX_USERNAME_LEN: usize = 64;

/// Longest accepted password in bytes
pub const MAX_PASSWORD_LEN: usize = 1024;

/// A registered user.
///
/// The username is stored normalized (trimmed and lowercased), which is what
/// makes the unique index on it case-insensitive. The password hash is a PHC
/// string and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Normalize and validate a username typed by the operator
    pub fn normalize_username(raw: &str) -> Result<String> {
        let username = raw.trim().to_lowercase();

        if username.is_empty() {
            return Err(Error::invalid_input("username cannot be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(Error::invalid_input(format!(
                "username cannot be longer than {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::invalid_input("username cannot contain spaces"));
        }

        Ok(username)
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::invalid_input("password cannot be empty"));
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(Error::invalid_input("password is too long"));
        }
        Ok(())
    }
}
