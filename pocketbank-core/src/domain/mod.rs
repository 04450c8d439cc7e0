//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod money;
mod password;
pub mod result;
mod session;
mod user;

pub use account::{Account, AccountNumber, AccountSummary, ACCOUNT_NUMBER_LEN};
pub use money::{Money, MAX_OPERATION_CENTS};
pub use password::Argon2Params;
pub use session::Session;
pub use user::User;
