//! DuckDB repository implementation

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, InfrastructureError, Result};
use crate::domain::{Account, AccountNumber, Money, User};
use crate::ports::{CreateOutcome, DebitOutcome, Repository, TransferOutcome};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Default bound on waiting for the connection
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const ACCOUNT_COLUMNS: &str =
    "account_id, account_number, owner_user_id, balance, created_at, updated_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_open_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Optimistic-concurrency failures reported by DuckDB
/// ("Conflict on update!", "write-write conflict", ...)
fn is_conflict_error(err_msg: &str) -> bool {
    err_msg.to_lowercase().contains("conflict")
}

/// Unique / primary key violations
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key")
        || lower.contains("unique constraint")
        || lower.contains("primary key constraint")
}

/// Which unique key a commit-time violation hit. DuckDB names the key
/// value, not the index.
fn classify_duplicate(msg: &str, account: &Account) -> CreateOutcome {
    if msg.contains(account.account_number.as_str()) {
        CreateOutcome::AccountNumberTaken
    } else {
        CreateOutcome::UsernameTaken
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        let msg = e.to_string();
        if is_conflict_error(&msg) {
            debug!(error = %msg, "database transaction conflict");
            Error::conflict(msg)
        } else {
            error!(error = %msg, "database failure");
            Error::database(msg)
        }
    }
}

/// Turn "no rows" into `None`
fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// DuckDB repository implementation
///
/// Registrations are serialized through `registrations`, which every clone
/// of one database shares. DuckDB cannot safely resolve two transactions
/// inserting the same unique key at commit time.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    registrations: Arc<Mutex<()>>,
    lock_timeout: Duration,
}

impl DuckDbRepository {
    /// Open (or create) the database file.
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when another process holds the database.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => return Ok(Self::from_connection(conn)),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_open_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            registrations: Arc::new(Mutex::new(())),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Bound how long a call waits for the connection before failing
    /// with a retryable timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// A second repository on its own connection to the same database.
    ///
    /// Each clone runs its own transactions, so balance updates from
    /// different clones can conflict with each other.
    pub fn try_clone(&self) -> Result<Self> {
        let conn = self.lock()?.try_clone()?;
        Ok(Self {
            conn: Mutex::new(conn),
            registrations: Arc::clone(&self.registrations),
            lock_timeout: self.lock_timeout,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading off: nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Acquire the connection, waiting at most `lock_timeout`
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .try_lock_for(self.lock_timeout)
            .ok_or_else(|| self.timed_out("database connection"))
    }

    fn timed_out(&self, what: &str) -> Error {
        warn!(
            timeout_ms = self.lock_timeout.as_millis() as u64,
            "timed out waiting for {}", what
        );
        InfrastructureError::Timeout(self.lock_timeout).into()
    }

    /// Apply pending migrations
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        let applied = MigrationService::new(&conn).run_pending()?;
        if !applied.is_empty() {
            info!(migrations = ?applied, "database schema migrated");
        }
        Ok(())
    }

    fn query_account(&self, where_clause: &str, key: &str) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM sys_accounts WHERE {}", ACCOUNT_COLUMNS, where_clause);
        let row = optional(conn.query_row(&sql, params![key], AccountRow::read))?;
        row.map(AccountRow::into_account).transpose()
    }

    #[cfg(test)]
    fn set_balance_unchecked(&self, account_id: Uuid, cents: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sys_accounts SET balance = ? WHERE account_id = ?",
            params![cents, account_id.to_string()],
        )?;
        Ok(())
    }
}

impl Repository for DuckDbRepository {
    // === Users ===

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let row = optional(conn.query_row(
            "SELECT user_id, username, password_hash, created_at FROM sys_users WHERE username = ?",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        ))?;

        row.map(|(id, username, password_hash, created_at)| {
            Ok(User {
                id: parse_uuid(&id)?,
                username,
                password_hash,
                created_at: parse_timestamp(&created_at),
            })
        })
        .transpose()
    }

    fn create_user_with_account(&self, user: &User, account: &Account) -> Result<CreateOutcome> {
        // Held until commit, so the next registration's checks see this one
        let _registration = self
            .registrations
            .try_lock_for(self.lock_timeout)
            .ok_or_else(|| self.timed_out("registration lock"))?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Pre-checks give a clean answer; the unique indexes below still
        // catch anything that slips past them.
        let username_taken: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sys_users WHERE username = ?",
            params![user.username],
            |row| row.get(0),
        )?;
        if username_taken > 0 {
            return Ok(CreateOutcome::UsernameTaken);
        }

        let number_taken: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sys_accounts WHERE account_number = ?",
            params![account.account_number.as_str()],
            |row| row.get(0),
        )?;
        if number_taken > 0 {
            return Ok(CreateOutcome::AccountNumberTaken);
        }

        if let Err(e) = tx.execute(
            "INSERT INTO sys_users (user_id, username, password_hash, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        ) {
            if is_unique_violation(&e.to_string()) {
                return Ok(CreateOutcome::UsernameTaken);
            }
            return Err(e.into());
        }

        if let Err(e) = tx.execute(
            "INSERT INTO sys_accounts (account_id, account_number, owner_user_id, balance, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.account_number.as_str(),
                account.owner_user_id.to_string(),
                account.balance.cents(),
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        ) {
            // Dropping `tx` rolls back the user row as well
            if is_unique_violation(&e.to_string()) {
                return Ok(CreateOutcome::AccountNumberTaken);
            }
            return Err(e.into());
        }

        if let Err(e) = tx.commit() {
            let msg = e.to_string();
            if is_unique_violation(&msg) {
                return Ok(classify_duplicate(&msg, account));
            }
            return Err(e.into());
        }
        Ok(CreateOutcome::Created)
    }

    // === Accounts ===

    fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.query_account("account_id = ?", &id.to_string())
    }

    fn get_account_by_owner(&self, user_id: Uuid) -> Result<Option<Account>> {
        self.query_account("owner_user_id = ?", &user_id.to_string())
    }

    fn get_account_by_number(&self, number: &AccountNumber) -> Result<Option<Account>> {
        self.query_account("account_number = ?", number.as_str())
    }

    fn credit(&self, account_id: Uuid, amount: Money) -> Result<Option<Money>> {
        let conn = self.lock()?;
        let balance = optional(conn.query_row(
            "UPDATE sys_accounts SET balance = balance + ?, updated_at = ?
             WHERE account_id = ?
             RETURNING balance",
            params![amount.cents(), Utc::now().to_rfc3339(), account_id.to_string()],
            |row| row.get::<_, i64>(0),
        ))?;
        Ok(balance.map(Money::from_cents))
    }

    fn debit(&self, account_id: Uuid, amount: Money) -> Result<DebitOutcome> {
        let conn = self.lock()?;
        let id = account_id.to_string();

        // Check and decrement in one statement
        let balance = optional(conn.query_row(
            "UPDATE sys_accounts SET balance = balance - ?, updated_at = ?
             WHERE account_id = ? AND balance >= ?
             RETURNING balance",
            params![amount.cents(), Utc::now().to_rfc3339(), id, amount.cents()],
            |row| row.get::<_, i64>(0),
        ))?;
        if let Some(balance) = balance {
            return Ok(DebitOutcome::Applied(Money::from_cents(balance)));
        }

        // Nothing matched: either the account is missing or the funds are
        let current = optional(conn.query_row(
            "SELECT balance FROM sys_accounts WHERE account_id = ?",
            params![id],
            |row| row.get::<_, i64>(0),
        ))?;
        Ok(match current {
            Some(balance) => DebitOutcome::Insufficient(Money::from_cents(balance)),
            None => DebitOutcome::NotFound,
        })
    }

    fn transfer(&self, from_account_id: Uuid, to: &AccountNumber, amount: Money) -> Result<TransferOutcome> {
        let mut conn = self.lock()?;
        // Every early return below drops `tx`, which rolls back
        let tx = conn.transaction()?;
        let from = from_account_id.to_string();
        let now = Utc::now().to_rfc3339();

        let sender_number = optional(tx.query_row(
            "SELECT account_number FROM sys_accounts WHERE account_id = ?",
            params![from],
            |row| row.get::<_, String>(0),
        ))?;
        let Some(sender_number) = sender_number else {
            return Ok(TransferOutcome::SenderNotFound);
        };
        if sender_number == to.as_str() {
            return Ok(TransferOutcome::SameAccount);
        }

        let recipient_id = optional(tx.query_row(
            "SELECT account_id FROM sys_accounts WHERE account_number = ?",
            params![to.as_str()],
            |row| row.get::<_, String>(0),
        ))?;
        let Some(recipient_id) = recipient_id else {
            return Ok(TransferOutcome::RecipientNotFound);
        };

        let sender_balance = optional(tx.query_row(
            "UPDATE sys_accounts SET balance = balance - ?, updated_at = ?
             WHERE account_id = ? AND balance >= ?
             RETURNING balance",
            params![amount.cents(), now, from, amount.cents()],
            |row| row.get::<_, i64>(0),
        ))?;
        let Some(sender_balance) = sender_balance else {
            let current: i64 = tx.query_row(
                "SELECT balance FROM sys_accounts WHERE account_id = ?",
                params![from],
                |row| row.get(0),
            )?;
            return Ok(TransferOutcome::Insufficient(Money::from_cents(current)));
        };

        let credited = optional(tx.query_row(
            "UPDATE sys_accounts SET balance = balance + ?, updated_at = ?
             WHERE account_id = ?
             RETURNING balance",
            params![amount.cents(), now, recipient_id],
            |row| row.get::<_, i64>(0),
        ))?;
        if credited.is_none() {
            return Ok(TransferOutcome::RecipientNotFound);
        }

        tx.commit()?;
        Ok(TransferOutcome::Completed(Money::from_cents(sender_balance)))
    }

    // === Statistics ===

    fn count_users(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_users", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_accounts(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sys_accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    fn total_funds(&self) -> Result<Money> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row(
            "SELECT CAST(COALESCE(SUM(balance), 0) AS BIGINT) FROM sys_accounts",
            [],
            |row| row.get(0),
        )?;
        Ok(Money::from_cents(total))
    }
}

/// Raw account columns as read from DuckDB
struct AccountRow {
    id: String,
    account_number: String,
    owner_user_id: String,
    balance: i64,
    created_at: String,
    updated_at: String,
}

impl AccountRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_number: row.get(1)?,
            owner_user_id: row.get(2)?,
            balance: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_account(self) -> Result<Account> {
        Ok(Account {
            id: parse_uuid(&self.id)?,
            account_number: self
                .account_number
                .parse()
                .map_err(|_| Error::database(format!("corrupt account number: {}", self.account_number)))?,
            owner_user_id: parse_uuid(&self.owner_user_id)?,
            balance: Money::from_cents(self.balance),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

// Helper functions

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| Error::database(format!("corrupt id in database: {}", s)))
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn repo() -> DuckDbRepository {
        let repo = DuckDbRepository::open_in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn number(suffix: u32) -> AccountNumber {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        AccountNumber::from_parts(date, suffix).unwrap()
    }

    fn seed(repo: &DuckDbRepository, username: &str, suffix: u32) -> Account {
        let user = User::new(username, "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA");
        let account = Account::open(user.id, number(suffix));
        assert_eq!(
            repo.create_user_with_account(&user, &account).unwrap(),
            CreateOutcome::Created
        );
        account
    }

    // ==================== Error classification ====================

    #[test]
    fn test_conflict_messages_are_detected() {
        assert!(is_conflict_error("TransactionContext Error: Conflict on update!"));
        assert!(is_conflict_error("Catalog write-write conflict on create"));
        assert!(!is_conflict_error("Constraint Error: Duplicate key"));
    }

    #[test]
    fn test_unique_violation_messages_are_detected() {
        assert!(is_unique_violation(
            "Constraint Error: Duplicate key \"username: alice\" violates unique constraint."
        ));
        assert!(is_unique_violation(
            "Constraint Error: Duplicate key \"account_id: 1\" violates primary key constraint."
        ));
        assert!(!is_unique_violation("Out of Range Error: Overflow in addition"));
    }

    #[test]
    fn test_commit_time_duplicates_are_classified() {
        let user = User::new("user0", "hash");
        let account = Account::open(user.id, number(123_456));

        let on_username = "TransactionContext Error: Failed to commit: PRIMARY KEY or UNIQUE \
                           constraint violation: duplicate key \"user0\"";
        assert!(is_unique_violation(on_username));
        assert_eq!(classify_duplicate(on_username, &account), CreateOutcome::UsernameTaken);

        let on_number = "TransactionContext Error: Failed to commit: PRIMARY KEY or UNIQUE \
                         constraint violation: duplicate key \"20240115123456\"";
        assert_eq!(classify_duplicate(on_number, &account), CreateOutcome::AccountNumberTaken);
    }

    #[test]
    fn test_open_retry_messages() {
        assert!(is_retryable_open_error("IO Error: Could not set lock on file"));
        assert!(is_retryable_open_error("database is locked"));
        assert!(!is_retryable_open_error("Catalog Error: Table does not exist"));
    }

    // ==================== Registration ====================

    #[test]
    fn test_create_and_look_up() {
        let repo = repo();
        let account = seed(&repo, "alice", 111_111);

        let user = repo.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, account.owner_user_id);

        let by_owner = repo.get_account_by_owner(user.id).unwrap().unwrap();
        assert_eq!(by_owner.id, account.id);
        assert_eq!(by_owner.balance, Money::ZERO);

        let by_number = repo.get_account_by_number(&number(111_111)).unwrap().unwrap();
        assert_eq!(by_number.id, account.id);

        assert!(repo.find_user_by_username("nobody").unwrap().is_none());
        assert!(repo.get_account_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_writes_nothing() {
        let repo = repo();
        seed(&repo, "alice", 111_111);

        let user = User::new("alice", "hash");
        let account = Account::open(user.id, number(222_222));
        assert_eq!(
            repo.create_user_with_account(&user, &account).unwrap(),
            CreateOutcome::UsernameTaken
        );
        assert_eq!(repo.count_users().unwrap(), 1);
        assert_eq!(repo.count_accounts().unwrap(), 1);
    }

    #[test]
    fn test_account_number_collision_leaves_no_orphan_user() {
        let repo = repo();
        seed(&repo, "alice", 111_111);

        let user = User::new("bob", "hash");
        let account = Account::open(user.id, number(111_111));
        assert_eq!(
            repo.create_user_with_account(&user, &account).unwrap(),
            CreateOutcome::AccountNumberTaken
        );
        assert!(repo.find_user_by_username("bob").unwrap().is_none());
        assert_eq!(repo.count_users().unwrap(), 1);
    }

    // ==================== Balance mutation ====================

    #[test]
    fn test_credit_and_debit() {
        let repo = repo();
        let account = seed(&repo, "alice", 111_111);

        let balance = repo.credit(account.id, Money::from_cents(10_000)).unwrap();
        assert_eq!(balance, Some(Money::from_cents(10_000)));

        let outcome = repo.debit(account.id, Money::from_cents(2_500)).unwrap();
        assert_eq!(outcome, DebitOutcome::Applied(Money::from_cents(7_500)));

        let outcome = repo.debit(account.id, Money::from_cents(7_501)).unwrap();
        assert_eq!(outcome, DebitOutcome::Insufficient(Money::from_cents(7_500)));

        let stored = repo.get_account_by_id(account.id).unwrap().unwrap();
        assert_eq!(stored.balance, Money::from_cents(7_500));
    }

    #[test]
    fn test_mutations_on_missing_account() {
        let repo = repo();
        let missing = Uuid::new_v4();
        assert_eq!(repo.credit(missing, Money::from_cents(1)).unwrap(), None);
        assert_eq!(
            repo.debit(missing, Money::from_cents(1)).unwrap(),
            DebitOutcome::NotFound
        );
    }

    #[test]
    fn test_debit_can_empty_the_account() {
        let repo = repo();
        let account = seed(&repo, "alice", 111_111);
        repo.credit(account.id, Money::from_cents(500)).unwrap();

        let outcome = repo.debit(account.id, Money::from_cents(500)).unwrap();
        assert_eq!(outcome, DebitOutcome::Applied(Money::ZERO));
    }

    // ==================== Transfers ====================

    #[test]
    fn test_transfer_moves_funds() {
        let repo = repo();
        let alice = seed(&repo, "alice", 111_111);
        let bob = seed(&repo, "bob", 222_222);
        repo.credit(alice.id, Money::from_cents(10_000)).unwrap();

        let outcome = repo
            .transfer(alice.id, &bob.account_number, Money::from_cents(4_000))
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Completed(Money::from_cents(6_000)));

        let bob_now = repo.get_account_by_id(bob.id).unwrap().unwrap();
        assert_eq!(bob_now.balance, Money::from_cents(4_000));
        assert_eq!(repo.total_funds().unwrap(), Money::from_cents(10_000));
    }

    #[test]
    fn test_transfer_failures_change_nothing() {
        let repo = repo();
        let alice = seed(&repo, "alice", 111_111);
        let bob = seed(&repo, "bob", 222_222);
        repo.credit(alice.id, Money::from_cents(1_000)).unwrap();

        assert_eq!(
            repo.transfer(alice.id, &number(999_999), Money::from_cents(100)).unwrap(),
            TransferOutcome::RecipientNotFound
        );
        assert_eq!(
            repo.transfer(alice.id, &bob.account_number, Money::from_cents(1_001)).unwrap(),
            TransferOutcome::Insufficient(Money::from_cents(1_000))
        );
        assert_eq!(
            repo.transfer(alice.id, &alice.account_number, Money::from_cents(100)).unwrap(),
            TransferOutcome::SameAccount
        );
        assert_eq!(
            repo.transfer(Uuid::new_v4(), &bob.account_number, Money::from_cents(100)).unwrap(),
            TransferOutcome::SenderNotFound
        );

        let alice_now = repo.get_account_by_id(alice.id).unwrap().unwrap();
        let bob_now = repo.get_account_by_id(bob.id).unwrap().unwrap();
        assert_eq!(alice_now.balance, Money::from_cents(1_000));
        assert_eq!(bob_now.balance, Money::ZERO);
    }

    #[test]
    fn test_transfer_rolls_back_debit_when_credit_fails() {
        let repo = repo();
        let alice = seed(&repo, "alice", 111_111);
        let bob = seed(&repo, "bob", 222_222);
        repo.credit(alice.id, Money::from_cents(1_000)).unwrap();
        // Crediting bob will overflow BIGINT after alice was already debited
        repo.set_balance_unchecked(bob.id, i64::MAX - 10).unwrap();

        let result = repo.transfer(alice.id, &bob.account_number, Money::from_cents(100));
        assert!(result.is_err());

        let alice_now = repo.get_account_by_id(alice.id).unwrap().unwrap();
        let bob_now = repo.get_account_by_id(bob.id).unwrap().unwrap();
        assert_eq!(alice_now.balance, Money::from_cents(1_000));
        assert_eq!(bob_now.balance, Money::from_cents(i64::MAX - 10));
    }

    #[test]
    fn test_balance_cannot_go_negative_even_unchecked() {
        let repo = repo();
        let alice = seed(&repo, "alice", 111_111);
        assert!(repo.set_balance_unchecked(alice.id, -1).is_err());
    }

    // ==================== Connection lock ====================

    #[test]
    fn test_lock_timeout_is_retryable() {
        let repo = repo().with_lock_timeout(Duration::from_millis(30));
        let _held = repo.conn.lock();

        let err = repo.count_users().unwrap_err();
        assert!(matches!(
            err,
            Error::Infrastructure(InfrastructureError::Timeout(_))
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_clone_shares_the_database() {
        let repo = repo();
        let alice = seed(&repo, "alice", 111_111);

        let other = repo.try_clone().unwrap();
        assert_eq!(other.credit(alice.id, Money::from_cents(250)).unwrap(), Some(Money::from_cents(250)));

        let seen = repo.get_account_by_id(alice.id).unwrap().unwrap();
        assert_eq!(seen.balance, Money::from_cents(250));
    }

    #[test]
    fn test_registration_waits_for_in_flight_registration() {
        let repo = repo().with_lock_timeout(Duration::from_millis(30));
        let other = repo.try_clone().unwrap();
        let _held = repo.registrations.lock();

        let user = User::new("bob", "hash");
        let account = Account::open(user.id, number(222_222));
        let err = other.create_user_with_account(&user, &account).unwrap_err();
        assert!(matches!(err, Error::Infrastructure(InfrastructureError::Timeout(_))));
        assert!(other.find_user_by_username("bob").unwrap().is_none());
    }
}
