//! CLI command implementations

pub mod balance;
pub mod register;
pub mod shell;
pub mod status;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use pocketbank_core::{BankContext, Error, ErrorKind, OperationResult};
use tracing::debug;

/// Message shown for any infrastructure failure; details go to the log
pub const RETRY_LATER: &str = "An unexpected error occurred. Please try again later.";

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("POCKETBANK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".pocketbank"))
}

/// Open the bank in the data directory, creating it if needed
pub fn get_context() -> Result<BankContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    debug!(data_dir = %data_dir.display(), "opening bank");
    BankContext::new(&data_dir).context("Failed to open the bank")
}

/// Operator-facing text for a core error
pub fn describe_error(e: &Error) -> String {
    match e.kind() {
        ErrorKind::Infrastructure => RETRY_LATER.to_string(),
        _ => match e {
            Error::DuplicateUsername(name) => format!("The username '{}' is already taken", name),
            Error::AccountNotFound => "No account found for that user".to_string(),
            Error::InvalidCredentials => "Incorrect password".to_string(),
            Error::RecipientNotFound(number) => {
                format!("No account with number {} exists", number)
            }
            Error::InsufficientFunds { balance, .. } => {
                format!("Insufficient funds (available: {})", balance)
            }
            other => other.to_string(),
        },
    }
}

/// Print a failed envelope when `json` is set, then hand back the error for
/// the exit status
pub fn command_failed(e: Error, json: bool) -> anyhow::Error {
    let message = describe_error(&e);
    if json {
        let envelope = OperationResult::<()>::from(Err::<(), Error>(e));
        if let Ok(text) = serde_json::to_string_pretty(&envelope) {
            println!("{}", text);
        }
    }
    anyhow::anyhow!(message)
}

/// Username from --username or prompt
pub fn username_or_prompt(flag: Option<String>) -> Result<String> {
    match flag {
        Some(u) => Ok(u),
        None => Ok(Input::new().with_prompt("Username").interact_text()?),
    }
}

/// Password from POCKETBANK_PASSWORD or prompt
pub fn password_or_prompt(prompt: &str) -> Result<String> {
    if let Ok(p) = env::var("POCKETBANK_PASSWORD") {
        return Ok(p);
    }
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Password from POCKETBANK_PASSWORD or a prompt asked twice
pub fn new_password_or_prompt() -> Result<String> {
    if let Ok(p) = env::var("POCKETBANK_PASSWORD") {
        return Ok(p);
    }

    let p1 = Password::new().with_prompt("Choose a password").interact()?;
    let p2 = Password::new().with_prompt("Confirm password").interact()?;

    if p1 != p2 {
        anyhow::bail!("Passwords do not match");
    }
    Ok(p1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketbank_core::{InfrastructureError, Money};

    #[test]
    fn test_infrastructure_errors_are_generic() {
        let e = Error::from(InfrastructureError::Database("disk I/O error at page 7".into()));
        assert_eq!(describe_error(&e), RETRY_LATER);
    }

    #[test]
    fn test_business_errors_are_specific() {
        let e = Error::InsufficientFunds {
            balance: Money::from_cents(10_000),
            requested: Money::from_cents(15_000),
        };
        assert_eq!(describe_error(&e), "Insufficient funds (available: $100.00)");
        assert_eq!(
            describe_error(&Error::DuplicateUsername("alice".into())),
            "The username 'alice' is already taken"
        );
    }
}
