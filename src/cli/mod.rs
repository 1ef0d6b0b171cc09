pub mod categories;
pub mod categorize;
pub mod completions;
pub mod edit;
pub mod import;
pub mod init;
pub mod report;
pub mod review;
pub mod rules;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::error::Result;
use crate::session::Session;
use crate::settings::{get_data_dir, load_settings, Settings};

/// Open the session for the configured data directory, printing any
/// recovery warnings from loading.
pub(crate) fn open_session() -> Result<(Session, Settings)> {
    let settings = load_settings();
    let session = Session::open_dir(&get_data_dir(), &settings)?;
    for warning in session.warnings() {
        eprintln!("{}", warning.yellow());
    }
    Ok((session, settings))
}

#[derive(Parser)]
#[command(name = "penny", about = "Sort bank statement transactions into spending categories.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the rules file.
    Init {
        /// Path for penny data (default: ~/Documents/penny)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a statement CSV, replacing the stored transactions.
    Import {
        /// CSV with Date, Details, Amount and Debit/Credit columns
        file: String,
    },
    /// Re-run keyword rules over the stored transactions.
    Categorize,
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage category keywords.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// List stored transactions.
    Transactions {
        /// Only debits (expenses)
        #[arg(long, conflicts_with = "credits")]
        debits: bool,
        /// Only credits (payments)
        #[arg(long)]
        credits: bool,
    },
    /// Interactively correct the categories of debit transactions.
    Review {
        /// Only walk through uncategorized debits
        #[arg(long)]
        uncategorized: bool,
    },
    /// Set the category of a debit transaction and learn its details as a keyword.
    Edit {
        /// Transaction date
        #[arg(long)]
        date: String,
        /// Transaction details, exactly as stored
        #[arg(long)]
        details: Option<String>,
        /// New category name
        #[arg(long)]
        category: String,
    },
    /// Summaries of the stored transactions.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show data locations and summary counts.
    Status,
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category at the end of the rule order.
    Add { name: String },
    /// List categories in rule order.
    List,
    /// Delete a category; its transactions become Uncategorized.
    Delete { name: String },
    /// Move a category within the rule order (earlier categories win ties).
    Move {
        name: String,
        /// New 1-based position
        #[arg(long)]
        position: usize,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a keyword to a category.
    Add {
        /// Text matched case-insensitively inside transaction details
        keyword: String,
        /// Category name to assign
        #[arg(long)]
        category: String,
    },
    /// Remove a keyword from a category.
    Remove {
        keyword: String,
        #[arg(long)]
        category: String,
    },
    /// List all keywords by category.
    List,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Debit totals by category.
    Expenses,
    /// Credit totals.
    Payments,
}
