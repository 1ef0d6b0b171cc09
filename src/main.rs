mod classifier;
mod cleaner;
mod cli;
mod error;
mod fmt;
mod models;
mod reconciler;
mod reports;
mod rules;
mod session;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CategoriesCommands, Cli, Commands, ReportCommands, RulesCommands};

/// Logs go to stderr; `PENNY_LOG` overrides the default `penny=warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PENNY_LOG").unwrap_or_else(|_| EnvFilter::new("penny=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Categorize => cli::categorize::run(),
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Delete { name } => cli::categories::delete(&name),
            CategoriesCommands::Move { name, position } => cli::categories::move_to(&name, position),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Add { keyword, category } => cli::rules::add(&keyword, &category),
            RulesCommands::Remove { keyword, category } => cli::rules::remove(&keyword, &category),
            RulesCommands::List => cli::rules::list(),
        },
        Commands::Transactions { debits, credits } => cli::transactions::run(debits, credits),
        Commands::Review { uncategorized } => cli::review::run(uncategorized),
        Commands::Edit {
            date,
            details,
            category,
        } => cli::edit::run(&date, details.as_deref(), &category),
        Commands::Report { command } => match command {
            ReportCommands::Expenses => cli::report::expenses(),
            ReportCommands::Payments => cli::report::payments(),
        },
        Commands::Status => cli::status::run(),
        Commands::Completions { shell } => cli::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
