//! Account number source port

use crate::domain::result::Result;
use crate::domain::AccountNumber;

/// Produces candidate account numbers.
///
/// Candidates are not guaranteed unique; registration retries with a fresh
/// candidate when the storage layer reports a collision.
pub trait AccountNumberGenerator: Send + Sync {
    fn generate(&self) -> Result<AccountNumber>;
}
