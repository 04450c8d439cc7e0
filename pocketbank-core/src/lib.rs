//! Pocketbank Core - account ledger and authentication engine
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Account, Money, Session)
//! - **ports**: Trait definitions for external dependencies (Repository, AccountNumberGenerator)
//! - **services**: Business logic orchestration (AuthGateway, AccountLedger, LedgerService)
//! - **adapters**: Concrete implementations (DuckDB)
//!
//! The core never prints. Every operation returns a typed result and the
//! caller decides how to present it.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::{AccountNumberGenerator, Repository};
use services::{AccountLedger, AuthGateway, CredentialStore, DateRandomGenerator, LedgerService, StatusService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, InfrastructureError, OperationResult, Result};
pub use domain::{Account, AccountNumber, AccountSummary, Money, Session, User};

/// Database file inside the data directory
pub const DB_FILENAME: &str = "pocketbank.duckdb";

/// Main context for Pocketbank operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct BankContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub auth: AuthGateway,
    pub ledger: LedgerService,
    pub status_service: StatusService,
}

impl BankContext {
    /// Open the bank stored in `data_dir`
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        let config = Config::load(data_dir)?;
        let db_path = data_dir.join(DB_FILENAME);

        let repository = DuckDbRepository::new(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?
            .with_lock_timeout(config.lock_timeout());

        Self::with_repository(config, Arc::new(repository))
    }

    /// A bank backed by a private in-memory database
    pub fn in_memory(config: Config) -> anyhow::Result<Self> {
        let repository = DuckDbRepository::open_in_memory()?.with_lock_timeout(config.lock_timeout());
        Self::with_repository(config, Arc::new(repository))
    }

    /// Wire services around an already opened repository
    pub fn with_repository(config: Config, repository: Arc<DuckDbRepository>) -> anyhow::Result<Self> {
        Self::with_generator(config, repository, Arc::new(DateRandomGenerator::new()))
    }

    /// Wire services with a custom account number generator
    pub fn with_generator(
        config: Config,
        repository: Arc<DuckDbRepository>,
        generator: Arc<dyn AccountNumberGenerator>,
    ) -> anyhow::Result<Self> {
        repository
            .ensure_schema()
            .context("Failed to initialize database schema")?;

        let port: Arc<dyn Repository> = repository.clone();

        let credentials = CredentialStore::new(Arc::clone(&port), config.argon2)?;
        let auth = AuthGateway::new(Arc::clone(&port), credentials, generator)
            .with_max_attempts(config.ledger.account_number_attempts);

        let account_ledger = AccountLedger::new(Arc::clone(&port))
            .with_conflict_retries(config.ledger.conflict_retries);
        let ledger = LedgerService::new(Arc::clone(&port), account_ledger);

        let status_service = StatusService::new(port);

        Ok(Self {
            config,
            repository,
            auth,
            ledger,
            status_service,
        })
    }
}
