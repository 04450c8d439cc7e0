//! Monetary amounts in integer minor units (cents)

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Largest amount accepted by a single deposit, withdrawal or transfer.
/// Keeps `balance + amount` far away from `i64` overflow.
pub const MAX_OPERATION_CENTS: i64 = 1_000_000_000_000;

/// An amount of money stored as a whole number of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Decimal view in major units (e.g. 1050 cents -> 10.50)
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse an operator-typed amount such as "10", "10.5" or "$1,000.25"
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',' && *c != '_')
            .collect();

        if cleaned.is_empty() {
            return Err(Error::invalid_amount("amount is required"));
        }

        let value: Decimal = cleaned
            .parse()
            .map_err(|_| Error::invalid_amount(format!("'{}' is not a number", input.trim())))?;

        let value = value.normalize();
        if value.scale() > 2 {
            return Err(Error::invalid_amount("at most two decimal places are allowed"));
        }

        let cents = (value * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(|| Error::invalid_amount("amount is too large"))?;

        Ok(Self(cents))
    }

    /// Check that this amount can be moved by a single ledger operation
    pub fn validate_operation_amount(self) -> Result<Self> {
        if self.0 <= 0 {
            return Err(Error::invalid_amount("amount must be greater than zero"));
        }
        if self.0 > MAX_OPERATION_CENTS {
            return Err(Error::invalid_amount(format!(
                "amount exceeds the per-operation limit of {}",
                Money(MAX_OPERATION_CENTS)
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}", Decimal::new(-self.0, 2))
        } else {
            write!(f, "${}", self.to_decimal())
        }
    }
}
