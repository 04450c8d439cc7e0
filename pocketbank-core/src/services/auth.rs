//! Auth gateway - registration and login

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::result::{Error, InfrastructureError, Result};
use crate::domain::{Account, AccountSummary, Session};
use crate::ports::{AccountNumberGenerator, CreateOutcome, Repository};

use super::CredentialStore;

/// Default number of account numbers tried before registration gives up
pub const DEFAULT_ACCOUNT_NUMBER_ATTEMPTS: u32 = 5;

/// Registers users with their accounts and turns credentials into sessions
pub struct AuthGateway {
    repository: Arc<dyn Repository>,
    credentials: CredentialStore,
    generator: Arc<dyn AccountNumberGenerator>,
    max_attempts: u32,
}

impl AuthGateway {
    pub fn new(
        repository: Arc<dyn Repository>,
        credentials: CredentialStore,
        generator: Arc<dyn AccountNumberGenerator>,
    ) -> Self {
        Self {
            repository,
            credentials,
            generator,
            max_attempts: DEFAULT_ACCOUNT_NUMBER_ATTEMPTS,
        }
    }

    /// Set how many account numbers are tried before `GenerationExhausted`
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Register a user and open their zero-balance account.
    ///
    /// The user and account rows are written in one transaction, so a failed
    /// registration never leaves a user without an account.
    pub fn register(&self, username: &str, password: &str) -> Result<AccountSummary> {
        let user = self.credentials.enroll(username, password)?;

        for attempt in 1..=self.max_attempts {
            let account = Account::open(user.id, self.generator.generate()?);

            match self.repository.create_user_with_account(&user, &account)? {
                CreateOutcome::Created => {
                    info!(username = %user.username, "registered user");
                    return Ok(AccountSummary {
                        username: user.username,
                        account_number: account.account_number,
                        balance: account.balance,
                    });
                }
                CreateOutcome::UsernameTaken => {
                    return Err(Error::DuplicateUsername(user.username));
                }
                CreateOutcome::AccountNumberTaken => {
                    debug!(attempt, max = self.max_attempts, "account number collision, retrying");
                }
            }
        }

        error!(
            username = %user.username,
            attempts = self.max_attempts,
            "could not allocate a unique account number"
        );
        Err(InfrastructureError::GenerationExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }

    /// Verify credentials and open a session on the user's account
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = match self.credentials.verify(username, password) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "login failed");
                return Err(e);
            }
        };

        let account = self
            .repository
            .get_account_by_owner(user.id)?
            .ok_or(Error::AccountNotFound)?;

        info!(username = %user.username, "login succeeded");
        Ok(Session::new(user.id, account.id, user.username))
    }
}
