//! Account domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};
use super::Money;

/// Digits in the date prefix of an account number (`YYYYMMDD`)
pub const ACCOUNT_NUMBER_DATE_LEN: usize = 8;

/// Total digits in an account number
pub const ACCOUNT_NUMBER_LEN: usize = 14;

/// Externally visible account identifier: `YYYYMMDD` followed by six digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Build an account number from its date component and random suffix.
    /// The suffix must be in `100000..=999999`.
    pub fn from_parts(date: NaiveDate, suffix: u32) -> Result<Self> {
        if !(100_000..=999_999).contains(&suffix) {
            return Err(Error::invalid_input(format!(
                "account number suffix out of range: {}",
                suffix
            )));
        }
        Ok(Self(format!("{}{}", date.format("%Y%m%d"), suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != ACCOUNT_NUMBER_LEN || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::invalid_input(format!(
                "account number must be {} digits",
                ACCOUNT_NUMBER_LEN
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bank account. Exactly one exists per user, created together with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub account_number: AccountNumber,
    pub owner_user_id: Uuid,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open a new zero-balance account for a user
    pub fn open(owner_user_id: Uuid, account_number: AccountNumber) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_number,
            owner_user_id,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What the operator sees about an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub username: String,
    pub account_number: AccountNumber,
    pub balance: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number_from_parts() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let number = AccountNumber::from_parts(date, 123_456).unwrap();
        assert_eq!(number.as_str(), "20240307123456");
        assert_eq!(number.as_str().len(), ACCOUNT_NUMBER_LEN);
    }

    #[test]
    fn test_account_number_suffix_range() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert!(AccountNumber::from_parts(date, 99_999).is_err());
        assert!(AccountNumber::from_parts(date, 1_000_000).is_err());
        assert!(AccountNumber::from_parts(date, 100_000).is_ok());
        assert!(AccountNumber::from_parts(date, 999_999).is_ok());
    }

    #[test]
    fn test_account_number_parsing() {
        assert!("20240307123456".parse::<AccountNumber>().is_ok());
        assert!(" 20240307123456 ".parse::<AccountNumber>().is_ok());
        assert!("2024030712345".parse::<AccountNumber>().is_err());
        assert!("2024030712345x".parse::<AccountNumber>().is_err());
        assert!("unknown-number".parse::<AccountNumber>().is_err());
    }

    #[test]
    fn test_new_account_starts_empty() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let account = Account::open(Uuid::new_v4(), AccountNumber::from_parts(date, 555_555).unwrap());
        assert_eq!(account.balance, Money::ZERO);
    }
}
