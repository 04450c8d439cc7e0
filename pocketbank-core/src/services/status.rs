//! Status service - bank-wide summary

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::Money;
use crate::ports::Repository;

/// Status service for operator summaries
pub struct StatusService {
    repository: Arc<dyn Repository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        Ok(StatusSummary {
            total_users: self.repository.count_users()?,
            total_accounts: self.repository.count_accounts()?,
            total_funds: self.repository.total_funds()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_users: i64,
    pub total_accounts: i64,
    /// Sum of all balances in cents
    pub total_funds: Money,
}
