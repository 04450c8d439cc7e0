//! Repository port - persistence abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, AccountNumber, Money, User};

/// Outcome of inserting a user together with their account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Nothing was written: the username is already registered
    UsernameTaken,
    /// Nothing was written: the account number collides with an existing one
    AccountNumberTaken,
}

/// Outcome of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The debit was applied; carries the new balance
    Applied(Money),
    /// Nothing was written; carries the balance that was too low
    Insufficient(Money),
    NotFound,
}

/// Outcome of a transfer. Every variant other than `Completed` means
/// neither balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Carries the sender's new balance
    Completed(Money),
    SenderNotFound,
    RecipientNotFound,
    SameAccount,
    /// Carries the sender's balance that was too low
    Insufficient(Money),
}

/// Database repository abstraction
///
/// Every balance mutation is a single atomic step in the store: increments
/// and conditional decrements are done in one statement, and the two-row
/// operations (registration and transfer) run inside one transaction.
/// Implementations must never read a balance into memory and write it back.
pub trait Repository: Send + Sync {
    // === Users ===

    /// Look up a user by normalized username
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a user and their account as one unit
    fn create_user_with_account(&self, user: &User, account: &Account) -> Result<CreateOutcome>;

    // === Accounts ===

    fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    fn get_account_by_owner(&self, user_id: Uuid) -> Result<Option<Account>>;

    fn get_account_by_number(&self, number: &AccountNumber) -> Result<Option<Account>>;

    /// Atomically add `amount` to the balance. Returns the new balance, or
    /// `None` if the account does not exist.
    fn credit(&self, account_id: Uuid, amount: Money) -> Result<Option<Money>>;

    /// Atomically subtract `amount` if and only if the balance covers it
    fn debit(&self, account_id: Uuid, amount: Money) -> Result<DebitOutcome>;

    /// Move `amount` from one account to another as one unit
    fn transfer(&self, from_account_id: Uuid, to: &AccountNumber, amount: Money) -> Result<TransferOutcome>;

    // === Statistics ===

    fn count_users(&self) -> Result<i64>;

    fn count_accounts(&self) -> Result<i64>;

    /// Sum of all account balances
    fn total_funds(&self) -> Result<Money>;
}
