use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_session;
use crate::error::Result;

pub fn run(file: &str) -> Result<()> {
    let (mut session, _) = open_session()?;
    let result = session.import_file(&PathBuf::from(file))?;

    println!(
        "{} imported, {} dropped (invalid amount, date or direction)",
        result.clean.kept, result.clean.dropped
    );
    println!(
        "{} categorized, {} uncategorized",
        result.classify.categorized, result.classify.uncategorized
    );
    println!("{}", "File processed successfully!".green());
    Ok(())
}
