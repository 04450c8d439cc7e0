//! Authenticated session

use serde::Serialize;
use uuid::Uuid;

/// Binding between a logged-in user and their account.
///
/// Only `AuthGateway::login` can create one, so holding a `Session` is proof
/// that the credentials were verified. Sessions are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    user_id: Uuid,
    account_id: Uuid,
    username: String,
}

impl Session {
    pub(crate) fn new(user_id: Uuid, account_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            account_id,
            username: username.into(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
