use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::Result;
use crate::fmt::{date, money};
use crate::models::Direction;

pub fn run(debits: bool, credits: bool) -> Result<()> {
    let (session, settings) = open_session()?;
    let rows: Vec<_> = session
        .transactions()
        .iter()
        .filter(|t| match (debits, credits) {
            (true, _) => t.direction == Direction::Debit,
            (_, true) => t.direction == Direction::Credit,
            _ => true,
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "No transactions found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Details", "Amount", "Debit/Credit", "Category"]);
    for txn in rows {
        table.add_row(vec![
            Cell::new(date(txn.date)),
            Cell::new(txn.details.as_deref().unwrap_or("")),
            Cell::new(money(txn.amount, &settings.currency)),
            Cell::new(txn.direction),
            Cell::new(&txn.category),
        ]);
    }
    println!("{table}");
    Ok(())
}
