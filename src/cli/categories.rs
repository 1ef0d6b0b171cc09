use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::{PennyError, Result};

pub fn add(name: &str) -> Result<()> {
    let (mut session, _) = open_session()?;
    if !session.add_category(name)? {
        return Err(PennyError::Other(format!(
            "Category '{}' already exists or is blank",
            name.trim()
        )));
    }
    println!("Category '{}' added!", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let (session, _) = open_session()?;
    let rules = session.rules();

    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Keywords", "Transactions"]);
    for (i, cat) in rules.iter().enumerate() {
        let count = session
            .transactions()
            .iter()
            .filter(|t| t.category == cat.name)
            .count();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&cat.name),
            Cell::new(cat.keywords.len()),
            Cell::new(count),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let (mut session, _) = open_session()?;
    if !session.delete_category(name)? {
        return Err(PennyError::Other(format!(
            "Cannot delete '{name}': unknown or built-in category"
        )));
    }
    println!("Deleted category '{name}'");
    Ok(())
}

pub fn move_to(name: &str, position: usize) -> Result<()> {
    let (mut session, _) = open_session()?;
    if !session.move_category(name, position.saturating_sub(1))? {
        return Err(PennyError::UnknownCategory(name.to_string()));
    }
    println!("Order: {}", session.rules().categories().join(" \u{2192} "));
    Ok(())
}
