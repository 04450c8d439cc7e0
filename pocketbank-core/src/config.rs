//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "security": { "argon2": { "memoryCost": 19456, "timeCost": 2, "parallelism": 1 } },
//!   "ledger": { "accountNumberAttempts": 5, "conflictRetries": 3, "lockTimeoutMs": 5000 }
//! }
//! ```
//! Every field is optional.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapters::duckdb::DEFAULT_LOCK_TIMEOUT;
use crate::domain::Argon2Params;
use crate::services::{DEFAULT_ACCOUNT_NUMBER_ATTEMPTS, DEFAULT_CONFLICT_RETRIES};

/// Environment variable overriding `ledger.lockTimeoutMs`
pub const LOCK_TIMEOUT_ENV: &str = "POCKETBANK_LOCK_TIMEOUT_MS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    security: SecuritySettings,
    #[serde(default)]
    ledger: LedgerSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecuritySettings {
    #[serde(default)]
    argon2: Argon2Params,
}

/// Ledger tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Account numbers tried per registration before giving up
    pub account_number_attempts: u32,
    /// Retries after a transaction conflict before surfacing it
    pub conflict_retries: u32,
    /// Longest wait for the database connection
    pub lock_timeout_ms: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            account_number_attempts: DEFAULT_ACCOUNT_NUMBER_ATTEMPTS,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Pocketbank configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub argon2: Argon2Params,
    pub ledger: LedgerSettings,
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing file yields defaults. The lock timeout can be overridden
    /// with `POCKETBANK_LOCK_TIMEOUT_MS`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %settings_path.display(), error = %e, "ignoring malformed settings file");
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let mut ledger = raw.ledger;
        if let Ok(value) = std::env::var(LOCK_TIMEOUT_ENV) {
            match value.trim().parse::<u64>() {
                Ok(ms) => ledger.lock_timeout_ms = ms,
                Err(_) => warn!(value = %value, "ignoring invalid {}", LOCK_TIMEOUT_ENV),
            }
        }

        Ok(Self {
            argon2: raw.security.argon2,
            ledger,
        })
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger.lock_timeout_ms)
    }
}
