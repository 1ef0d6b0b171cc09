use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::Result;
use crate::fmt::money;
use crate::reports;

pub fn expenses() -> Result<()> {
    let (session, settings) = open_session()?;
    let summary = reports::expense_summary(session.transactions());
    if summary.is_empty() {
        println!("{}", "No debit transactions found.".yellow());
        return Ok(());
    }

    let grand_total: f64 = summary.iter().map(|c| c.total).sum();
    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Amount", "%"]);
    for item in &summary {
        let pct = if grand_total != 0.0 {
            item.total / grand_total * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(item.count),
            Cell::new(money(item.total, &settings.currency)),
            Cell::new(format!("{pct:.1}%")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(summary.iter().map(|c| c.count).sum::<usize>()),
        Cell::new(money(grand_total, &settings.currency)),
        Cell::new(""),
    ]);
    println!("Expense Summary\n{table}");
    Ok(())
}

pub fn payments() -> Result<()> {
    let (session, settings) = open_session()?;
    let summary = reports::payments_summary(session.transactions());
    if summary.count == 0 {
        println!("{}", "No credit transactions found.".yellow());
        return Ok(());
    }
    println!(
        "Total Payments: {} ({} transactions)",
        money(summary.total, &settings.currency).green(),
        summary.count
    );
    Ok(())
}
