pub mod accounts;
pub mod backup;
pub mod balance;
pub mod categories;
pub mod export;
pub mod init;
pub mod periods;
pub mod recurring;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};
use colored::Colorize;

use tally::error::{LedgerError, Result};
use tally::fmt::money;
use tally::settings::{load_settings, Settings};
use tally::Ledger;

/// Open the configured database, creating the default account on first use.
pub(crate) fn open_ledger() -> Result<Ledger> {
    let settings = load_settings();
    open_ledger_with(&settings)
}

pub(crate) fn open_ledger_with(settings: &Settings) -> Result<Ledger> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(LedgerError::Settings(format!(
            "No database found at {}\nRun `tally init` to set up.",
            db_path.display()
        )));
    }
    let mut ledger = Ledger::open(&db_path)?;
    ledger.ensure_default_account(&settings.default_account_name, settings.default_period_start_day)?;
    Ok(ledger)
}

/// Explicit `--account`, else the default (lowest id) account.
pub(crate) fn resolve_account(ledger: &Ledger, account: Option<i64>) -> Result<i64> {
    match account {
        Some(id) => Ok(ledger.account(id)?.account.id),
        None => ledger
            .default_account_id()?
            .ok_or_else(|| LedgerError::Inconsistent("no accounts in the database".to_string())),
    }
}

/// Signed amount, green for inflows and red for outflows.
pub(crate) fn signed(cents: i64) -> String {
    if cents < 0 {
        money(cents).red().to_string()
    } else {
        money(cents).green().to_string()
    }
}

#[derive(Parser)]
#[command(name = "tally", about = "Personal budgeting ledger with monthly periods and recurring bills.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: choose a data directory, create the database and the default account.
    Init {
        /// Path for tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// List periods or roll over to the next one.
    Periods {
        #[command(subcommand)]
        command: PeriodsCommands,
    },
    /// Manage transactions in the active period.
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// Manage recurring templates and apply them to a period.
    Recurring {
        #[command(subcommand)]
        command: RecurringCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show an account balance.
    Balance {
        #[arg(long)]
        account: Option<i64>,
        /// Period ID (default: the active period)
        #[arg(long, conflicts_with = "all")]
        period: Option<i64>,
        /// Sum over every period
        #[arg(long)]
        all: bool,
    },
    /// Export one period's transactions to CSV.
    Export {
        #[arg(long)]
        account: Option<i64>,
        /// Period ID (default: the active period)
        #[arg(long)]
        period: Option<i64>,
        /// Output path (default: <data_dir>/exports/tally-<account>-<period>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/tally-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account and open its first period.
    Add {
        name: String,
        /// Day of the month each period starts (1-31)
        #[arg(long = "start-day")]
        start_day: u32,
    },
    /// List all accounts with their active period and balance.
    List,
    /// Rename an account or change its start day (applies from the next rollover).
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "start-day")]
        start_day: Option<u32>,
    },
    /// Delete an account and all of its history.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum PeriodsCommands {
    /// List periods, newest first, with their balances.
    List {
        #[arg(long)]
        account: Option<i64>,
    },
    /// Close the active period and open the next, carrying the balance forward.
    Rollover {
        #[arg(long)]
        account: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record a transaction in the active period.
    Add {
        name: String,
        /// Amount, negative for spending: -12.50
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        account: Option<i64>,
        /// Date: YYYY-MM-DD (default: now)
        #[arg(long)]
        date: Option<String>,
        /// Category ID
        #[arg(long)]
        category: Option<i64>,
    },
    /// List transactions, newest first.
    List {
        #[arg(long)]
        account: Option<i64>,
        /// Period ID (default: all periods)
        #[arg(long)]
        period: Option<i64>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Edit a transaction in an open period.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// Category ID, or 0 to clear
        #[arg(long)]
        category: Option<i64>,
    },
    /// Delete a transaction.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Add a recurring template.
    Add {
        name: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Day of the month it occurs (1-31)
        #[arg(long)]
        day: u32,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        account: Option<i64>,
    },
    /// List templates and whether each is accounted for in the active period.
    List {
        #[arg(long)]
        account: Option<i64>,
        #[arg(long)]
        period: Option<i64>,
    },
    /// Replace a template's fields. Already applied periods keep their snapshot.
    Update {
        id: i64,
        name: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        day: u32,
        #[arg(long)]
        category: Option<i64>,
    },
    /// Delete a template.
    Delete { id: i64 },
    /// Apply a template to a period (default: the active period).
    Apply {
        id: i64,
        #[arg(long)]
        period: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        /// Display color, e.g. #336699
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        account: Option<i64>,
    },
    /// List categories.
    List {
        #[arg(long)]
        account: Option<i64>,
    },
    /// Rename or recolor a category.
    Update {
        id: i64,
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category; its transactions and templates become uncategorized.
    Delete { id: i64 },
}
