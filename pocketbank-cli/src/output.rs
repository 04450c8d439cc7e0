//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Spinner shown while an operation is in flight.
///
/// Created by [`Status::begin`] and consumed by exactly one of
/// [`Status::succeed`] or [`Status::fail`].
pub struct Status {
    bar: ProgressBar,
}

impl Status {
    pub fn begin(msg: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(msg.into());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn succeed(self, msg: &str) {
        self.bar.finish_and_clear();
        println!("{} {}", "✔".green(), msg.green());
    }

    pub fn fail(self, msg: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", "✖".red(), msg.red());
    }
}
