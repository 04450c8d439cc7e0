//! Pocketbank CLI - a personal bank account in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{balance, register, shell, status};

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "POCKETBANK_LOG";

/// Pocketbank - register, log in and move money between accounts
#[derive(Parser)]
#[command(name = "pbank", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive banking shell (default)
    Shell,

    /// Register a new user and open their account
    Register {
        /// Username (prompted if omitted)
        #[arg(long)]
        username: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in and show the account balance
    Balance {
        /// Username (prompted if omitted)
        #[arg(long)]
        username: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show users, accounts and total funds held
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so they never interleave with prompts
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run(),
        Commands::Register { username, json } => register::run(username, json),
        Commands::Balance { username, json } => balance::run(username, json),
        Commands::Status { json } => status::run(json),
    }
}
