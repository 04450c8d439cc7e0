//! Result and error types for the core library

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Money;

/// Broad classification of an [`Error`], used by callers to decide presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Caller input was malformed
    Validation,
    /// Expected outcome of registration or login
    Auth,
    /// Expected outcome of a ledger operation
    Domain,
    /// Storage or runtime failure; the operator should retry later
    Infrastructure,
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    #[error("Recipient account not found: {0}")]
    RecipientNotFound(String),

    #[error("Cannot transfer to the same account")]
    SameAccount,

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Unexpected failures below the ledger
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Timed out after {0:?} waiting for the database")]
    Timeout(Duration),

    #[error("Could not allocate a unique account number after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Infrastructure(InfrastructureError::Database(msg.into()))
    }

    /// Create a transaction conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Infrastructure(InfrastructureError::Conflict(msg.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount(_) | Error::InvalidInput(_) => ErrorKind::Validation,
            Error::DuplicateUsername(_) | Error::AccountNotFound | Error::InvalidCredentials => {
                ErrorKind::Auth
            }
            Error::InsufficientFunds { .. } | Error::RecipientNotFound(_) | Error::SameAccount => {
                ErrorKind::Domain
            }
            Error::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }

    /// True for failures that may succeed when the same call is repeated
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Infrastructure(InfrastructureError::Conflict(_))
                | Error::Infrastructure(InfrastructureError::Timeout(_))
        )
    }

    /// True for optimistic-concurrency conflicts reported by the storage engine
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Infrastructure(InfrastructureError::Conflict(_)))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Infrastructure(InfrastructureError::Io(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Infrastructure(InfrastructureError::Json(e))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Create a failed result with context
    pub fn fail_with_context(
        error: impl Into<String>,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                let mut context = HashMap::new();
                context.insert("kind".to_string(), serde_json::json!(e.kind()));
                Self::fail_with_context(e.to_string(), context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::invalid_amount("zero").kind(), ErrorKind::Validation);
        assert_eq!(Error::InvalidCredentials.kind(), ErrorKind::Auth);
        assert_eq!(Error::SameAccount.kind(), ErrorKind::Domain);
        assert_eq!(Error::database("boom").kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_only_conflicts_and_timeouts_are_retryable() {
        assert!(Error::conflict("write-write").is_retryable());
        assert!(Error::from(InfrastructureError::Timeout(Duration::from_millis(5))).is_retryable());
        assert!(!Error::database("disk full").is_retryable());
        assert!(!Error::from(InfrastructureError::GenerationExhausted { attempts: 5 }).is_retryable());
        assert!(!Error::AccountNotFound.is_retryable());
    }

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_from_result_carries_kind() {
        let err: Result<i32> = Err(Error::RecipientNotFound("20240101123456".into()));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Recipient account not found"));
        assert_eq!(result.context.unwrap()["kind"], serde_json::json!("domain"));
    }
}
