use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::{PennyError, Result};
use crate::models::UNCATEGORIZED;

pub fn add(keyword: &str, category: &str) -> Result<()> {
    let (mut session, _) = open_session()?;
    if !session.rules().contains(category) {
        return Err(PennyError::UnknownCategory(category.to_string()));
    }
    if category == UNCATEGORIZED {
        return Err(PennyError::Other(format!(
            "{UNCATEGORIZED} is the fallback and cannot hold keywords"
        )));
    }
    if session.add_keyword(category, keyword)? {
        println!("Added keyword: '{}' \u{2192} {category}", keyword.trim());
    } else {
        println!("'{}' is already a keyword of {category}", keyword.trim());
    }
    Ok(())
}

pub fn remove(keyword: &str, category: &str) -> Result<()> {
    let (mut session, _) = open_session()?;
    if !session.remove_keyword(category, keyword)? {
        return Err(PennyError::Other(format!(
            "No keyword '{keyword}' in category '{category}'"
        )));
    }
    println!("Removed keyword: '{keyword}' from {category}");
    Ok(())
}

pub fn list() -> Result<()> {
    let (session, _) = open_session()?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Keyword"]);
    let rules = session.rules();
    for name in rules.categories() {
        for keyword in rules.keywords(name).unwrap_or_default() {
            table.add_row(vec![Cell::new(name), Cell::new(keyword)]);
        }
    }
    println!("Rules\n{table}");
    Ok(())
}
