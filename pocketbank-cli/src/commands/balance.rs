//! Balance command - log in and show the account summary

use anyhow::Result;
use colored::Colorize;
use pocketbank_core::OperationResult;

use super::{command_failed, get_context, password_or_prompt, username_or_prompt};
use crate::output::create_table;

pub fn run(username: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let username = username_or_prompt(username)?;
    let password = password_or_prompt("Password")?;

    let summary = ctx
        .auth
        .login(&username, &password)
        .and_then(|session| ctx.ledger.account(&session))
        .map_err(|e| command_failed(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&summary))?);
        return Ok(());
    }

    let mut table = create_table();
    table.add_row(vec!["Username", summary.username.as_str()]);
    table.add_row(vec!["Account number", summary.account_number.as_str()]);
    table.add_row(vec!["Balance".to_string(), summary.balance.to_string().bold().to_string()]);

    println!("{}", table);
    Ok(())
}
