//! Ledger service - the session-scoped façade used by the CLI

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountSummary, Money, Session};
use crate::ports::Repository;

use super::AccountLedger;

/// Balance operations on behalf of a logged-in user.
///
/// Every call takes the caller's `Session`; the account id comes from the
/// session, never from the caller, so a user can only act on their own
/// account. Any number of sessions may use one service concurrently.
pub struct LedgerService {
    repository: Arc<dyn Repository>,
    ledger: AccountLedger,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn Repository>, ledger: AccountLedger) -> Self {
        Self { repository, ledger }
    }

    pub fn deposit(&self, session: &Session, amount: Money) -> Result<Money> {
        self.ledger.deposit(session.account_id(), amount)
    }

    pub fn withdraw(&self, session: &Session, amount: Money) -> Result<Money> {
        self.ledger.withdraw(session.account_id(), amount)
    }

    pub fn transfer(&self, session: &Session, recipient_account_number: &str, amount: Money) -> Result<Money> {
        self.ledger
            .transfer(session.account_id(), recipient_account_number, amount)
    }

    pub fn balance(&self, session: &Session) -> Result<Money> {
        self.ledger.balance(session.account_id())
    }

    /// Username, account number and balance of the session's account
    pub fn account(&self, session: &Session) -> Result<AccountSummary> {
        let account = self
            .repository
            .get_account_by_id(session.account_id())?
            .ok_or(Error::AccountNotFound)?;

        Ok(AccountSummary {
            username: session.username().to_string(),
            account_number: account.account_number,
            balance: account.balance,
        })
    }
}
