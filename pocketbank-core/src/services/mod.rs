//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account_number;
mod auth;
mod banking;
mod credentials;
mod ledger;
pub mod migration;
mod status;

pub use account_number::DateRandomGenerator;
pub use auth::{AuthGateway, DEFAULT_ACCOUNT_NUMBER_ATTEMPTS};
pub use banking::LedgerService;
pub use credentials::CredentialStore;
pub use ledger::{AccountLedger, DEFAULT_CONFLICT_RETRIES};
pub use migration::MigrationService;
pub use status::{StatusService, StatusSummary};
