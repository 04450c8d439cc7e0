//! Account ledger - balance reads and mutations
//!
//! Every mutation is delegated to a single atomic primitive of the
//! repository (increment, conditional decrement, or a transactional
//! transfer). Nothing here reads a balance and writes it back.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountNumber, Money};
use crate::ports::{DebitOutcome, Repository, TransferOutcome};

/// Default number of retries after a transaction conflict
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Initial backoff after a conflict in milliseconds (doubles each retry)
const INITIAL_CONFLICT_DELAY_MS: u64 = 10;

pub struct AccountLedger {
    repository: Arc<dyn Repository>,
    conflict_retries: u32,
}

impl AccountLedger {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Add `amount` to the account and return the new balance
    pub fn deposit(&self, account_id: Uuid, amount: Money) -> Result<Money> {
        let amount = amount.validate_operation_amount()?;

        self.with_conflict_retry("deposit", || self.repository.credit(account_id, amount))?
            .ok_or(Error::AccountNotFound)
    }

    /// Take `amount` out of the account if the balance covers it
    pub fn withdraw(&self, account_id: Uuid, amount: Money) -> Result<Money> {
        let amount = amount.validate_operation_amount()?;

        match self.with_conflict_retry("withdraw", || self.repository.debit(account_id, amount))? {
            DebitOutcome::Applied(balance) => Ok(balance),
            DebitOutcome::Insufficient(balance) => Err(Error::InsufficientFunds {
                balance,
                requested: amount,
            }),
            DebitOutcome::NotFound => Err(Error::AccountNotFound),
        }
    }

    /// Move `amount` to the account with the given number. Either both
    /// balances change or neither does. Returns the sender's new balance.
    pub fn transfer(&self, account_id: Uuid, recipient: &str, amount: Money) -> Result<Money> {
        let amount = amount.validate_operation_amount()?;

        // A malformed number cannot belong to anyone
        let recipient_number: AccountNumber = match recipient.parse() {
            Ok(number) => number,
            Err(_) => {
                if self.repository.get_account_by_id(account_id)?.is_none() {
                    return Err(Error::AccountNotFound);
                }
                return Err(Error::RecipientNotFound(recipient.trim().to_string()));
            }
        };

        let outcome = self.with_conflict_retry("transfer", || {
            self.repository.transfer(account_id, &recipient_number, amount)
        })?;

        match outcome {
            TransferOutcome::Completed(balance) => Ok(balance),
            TransferOutcome::SenderNotFound => Err(Error::AccountNotFound),
            TransferOutcome::RecipientNotFound => {
                Err(Error::RecipientNotFound(recipient_number.to_string()))
            }
            TransferOutcome::SameAccount => Err(Error::SameAccount),
            TransferOutcome::Insufficient(balance) => Err(Error::InsufficientFunds {
                balance,
                requested: amount,
            }),
        }
    }

    pub fn balance(&self, account_id: Uuid) -> Result<Money> {
        self.repository
            .get_account_by_id(account_id)?
            .map(|account| account.balance)
            .ok_or(Error::AccountNotFound)
    }

    /// Re-run `op` after optimistic-concurrency conflicts, with exponential
    /// backoff, up to `conflict_retries` times
    fn with_conflict_retry<T>(&self, op: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match f() {
                Err(e) if e.is_conflict() && attempt < self.conflict_retries => {
                    let delay = Duration::from_millis(INITIAL_CONFLICT_DELAY_MS * 2u64.pow(attempt));
                    attempt += 1;
                    debug!(op, attempt, delay_ms = delay.as_millis() as u64, "retrying after conflict");
                    thread::sleep(delay);
                }
                Err(e) if e.is_conflict() => {
                    warn!(op, attempts = attempt + 1, error = %e, "giving up after repeated conflicts");
                    return Err(e);
                }
                other => return other,
            }
        }
    }
}
