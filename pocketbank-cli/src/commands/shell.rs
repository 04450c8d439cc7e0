//! Shell command - the interactive banking loop
//!
//! Anonymous users can register or log in. Once logged in the session is
//! held here and passed to every ledger call.

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password, Select};
use pocketbank_core::{BankContext, Money, Session};

use super::{describe_error, get_context};
use crate::output::{self, Status};

const ANONYMOUS_MENU: [&str; 3] = ["Register", "Login", "Exit"];
const ACCOUNT_MENU: [&str; 5] = ["Deposit", "Withdraw", "Check balance", "Transfer", "Exit"];

pub fn run() -> Result<()> {
    let ctx = get_context()?;
    let mut shell = Shell { ctx: &ctx, session: None };

    println!("{}", "Welcome to Pocketbank".bold());
    println!();

    while shell.step()? {}

    output::info("Goodbye!");
    Ok(())
}

struct Shell<'a> {
    ctx: &'a BankContext,
    session: Option<Session>,
}

impl Shell<'_> {
    /// Show one menu and handle the choice. Returns false on exit.
    fn step(&mut self) -> Result<bool> {
        let session = match self.session.clone() {
            None => return self.anonymous_step(),
            Some(session) => session,
        };

        let choice = Select::new()
            .with_prompt(format!("Logged in as {}", session.username()))
            .items(&ACCOUNT_MENU)
            .default(0)
            .interact()?;

        match choice {
            0 => self.deposit(&session)?,
            1 => self.withdraw(&session)?,
            2 => self.balance(&session),
            3 => self.transfer(&session)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn anonymous_step(&mut self) -> Result<bool> {
        let choice = Select::new()
            .with_prompt("What would you like to do?")
            .items(&ANONYMOUS_MENU)
            .default(0)
            .interact()?;

        match choice {
            0 => self.register()?,
            1 => self.login()?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn register(&mut self) -> Result<()> {
        let username: String = Input::new().with_prompt("Choose a username").interact_text()?;
        let password = Password::new()
            .with_prompt("Choose a password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;

        let status = Status::begin("Creating your account...");
        match self.ctx.auth.register(&username, &password) {
            Ok(summary) => {
                status.succeed(&format!(
                    "Account created. Your account number is {}",
                    summary.account_number
                ));
                output::info("Log in to start banking.");
            }
            Err(e) => status.fail(&describe_error(&e)),
        }
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let username: String = Input::new().with_prompt("Username").interact_text()?;
        let password = Password::new().with_prompt("Password").interact()?;

        let status = Status::begin("Logging in...");
        match self.ctx.auth.login(&username, &password) {
            Ok(session) => {
                status.succeed(&format!("Welcome back, {}!", session.username()));
                self.session = Some(session);
            }
            Err(e) => status.fail(&describe_error(&e)),
        }
        Ok(())
    }

    fn deposit(&self, session: &Session) -> Result<()> {
        let Some(amount) = prompt_amount("Amount to deposit")? else {
            return Ok(());
        };

        let status = Status::begin("Depositing...");
        match self.ctx.ledger.deposit(session, amount) {
            Ok(balance) => status.succeed(&format!("Deposited {}. New balance: {}", amount, balance)),
            Err(e) => status.fail(&describe_error(&e)),
        }
        Ok(())
    }

    fn withdraw(&self, session: &Session) -> Result<()> {
        let Some(amount) = prompt_amount("Amount to withdraw")? else {
            return Ok(());
        };

        let status = Status::begin("Withdrawing...");
        match self.ctx.ledger.withdraw(session, amount) {
            Ok(balance) => status.succeed(&format!("Withdrew {}. New balance: {}", amount, balance)),
            Err(e) => status.fail(&describe_error(&e)),
        }
        Ok(())
    }

    fn balance(&self, session: &Session) {
        let status = Status::begin("Fetching balance...");
        match self.ctx.ledger.account(session) {
            Ok(summary) => status.succeed(&format!(
                "Account {}: {}",
                summary.account_number, summary.balance
            )),
            Err(e) => status.fail(&describe_error(&e)),
        }
    }

    fn transfer(&self, session: &Session) -> Result<()> {
        let recipient: String = Input::new()
            .with_prompt("Recipient account number")
            .interact_text()?;
        let Some(amount) = prompt_amount("Amount to transfer")? else {
            return Ok(());
        };

        let status = Status::begin("Transferring...");
        match self.ctx.ledger.transfer(session, &recipient, amount) {
            Ok(balance) => status.succeed(&format!(
                "Sent {} to {}. New balance: {}",
                amount,
                recipient.trim(),
                balance
            )),
            Err(e) => status.fail(&describe_error(&e)),
        }
        Ok(())
    }
}

/// Ask for an amount. Unparseable or non-positive input is reported and
/// yields `None`, so nothing reaches the ledger.
fn prompt_amount(prompt: &str) -> Result<Option<Money>> {
    let raw: String = Input::new().with_prompt(prompt).interact_text()?;

    match Money::parse(&raw).and_then(Money::validate_operation_amount) {
        Ok(amount) => Ok(Some(amount)),
        Err(e) => {
            output::error(&describe_error(&e));
            Ok(None)
        }
    }
}
