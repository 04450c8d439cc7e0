//! Register command - create a user with a fresh account

use anyhow::Result;
use colored::Colorize;
use pocketbank_core::OperationResult;

use super::{command_failed, get_context, new_password_or_prompt, username_or_prompt};
use crate::output;

pub fn run(username: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let username = username_or_prompt(username)?;
    let password = new_password_or_prompt()?;

    let summary = ctx
        .auth
        .register(&username, &password)
        .map_err(|e| command_failed(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&summary))?);
        return Ok(());
    }

    output::success(&format!("Welcome, {}! Your account is ready.", summary.username));
    println!("Account number: {}", summary.account_number.as_str().bold());
    Ok(())
}
