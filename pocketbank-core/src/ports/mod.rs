//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod account_number;
mod repository;

pub use account_number::AccountNumberGenerator;
pub use repository::{CreateOutcome, DebitOutcome, Repository, TransferOutcome};
