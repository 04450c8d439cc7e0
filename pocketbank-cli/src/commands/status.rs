//! Status command - show what the bank holds

use anyhow::Result;
use colored::Colorize;
use pocketbank_core::services::StatusSummary;
use pocketbank_core::OperationResult;

use super::{command_failed, get_context};
use crate::output::create_table;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx
        .status_service
        .get_status()
        .map_err(|e| command_failed(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&status))?);
        return Ok(());
    }

    println!("{}", "Bank Status".bold());
    println!();
    println!("{}", render(&status));
    Ok(())
}

fn render(status: &StatusSummary) -> comfy_table::Table {
    let mut table = create_table();
    table.add_row(vec!["Users".to_string(), status.total_users.to_string()]);
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec!["Funds held".to_string(), status.total_funds.to_string()]);
    table
}
