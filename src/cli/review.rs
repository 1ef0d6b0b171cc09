use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use crate::cli::open_session;
use crate::error::Result;
use crate::fmt::{date, money};
use crate::models::UNCATEGORIZED;
use crate::reconciler::Reconciliation;

pub fn run(only_uncategorized: bool) -> Result<()> {
    let (mut session, settings) = open_session()?;
    let view = session.debit_view();
    if view.is_empty() {
        println!("{}", "No debit transactions found. Import a statement first.".yellow());
        return Ok(());
    }

    let pending: Vec<usize> = view
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !only_uncategorized || row.category == UNCATEGORIZED)
        .map(|(i, _)| i)
        .collect();

    if pending.is_empty() {
        println!("{}", "No debit transactions to review.".green());
        return Ok(());
    }

    let categories: Vec<String> = session
        .rules()
        .categories()
        .into_iter()
        .map(str::to_string)
        .collect();
    println!("\n{} transactions to review\n", pending.len());

    let mut cat_table = Table::new();
    cat_table.set_header(vec!["#", "Name"]);
    for (i, name) in categories.iter().enumerate() {
        cat_table.add_row(vec![Cell::new(i + 1), Cell::new(name)]);
    }
    println!("Categories\n{cat_table}\n");

    let mut edited = view.to_edit();
    let mut changes = 0usize;

    for idx in pending {
        let row = &view.rows()[idx];
        println!("{}", "\u{2500}".repeat(60));
        println!("  Date:        {}", date(row.date));
        println!("  Details:     {}", row.details.as_deref().unwrap_or("(none)"));
        println!("  Amount:      {}", money(row.amount, &settings.currency).red());
        println!("  Category:    {}", row.category);
        println!();

        let choice: String = Input::new()
            .with_prompt("Category # (Enter=keep, q=finish)")
            .allow_empty(true)
            .interact_text()
            .unwrap_or_default();
        let choice = choice.trim().to_lowercase();

        if choice == "q" {
            break;
        }
        if choice.is_empty() {
            continue;
        }
        let cat = match choice.parse::<usize>() {
            Ok(n) if n >= 1 && n <= categories.len() => &categories[n - 1],
            _ => {
                println!("{}", "Invalid choice, keeping current category.".red());
                continue;
            }
        };
        if *cat != row.category {
            edited[idx].category = cat.clone();
            changes += 1;
            println!("{}", format!("\u{2192} {cat}").green());
        }
        println!();
    }

    if changes == 0 {
        println!("{}", "No changes made.".yellow());
        return Ok(());
    }

    let apply = Confirm::new()
        .with_prompt(format!("Apply {changes} change(s)?"))
        .default(true)
        .interact()
        .unwrap_or(false);
    if !apply {
        println!("{}", "Changes discarded.".yellow());
        return Ok(());
    }

    let result = session.apply_edits(&edited)?;
    print_reconciliation(&result);
    Ok(())
}

pub(crate) fn print_reconciliation(result: &Reconciliation) {
    println!(
        "{} transaction(s) recategorized, {} without a match",
        result.updated_rows, result.skipped_rows
    );
    for (category, keyword) in &result.learned {
        println!("Learned keyword: '{keyword}' \u{2192} {category}");
    }
    for (category, keyword) in &result.forgotten {
        println!("Forgot keyword: '{keyword}' (was {category})");
    }
    for category in &result.rejected {
        println!("{}", format!("Unknown category '{category}' ignored").red());
    }
    if result.is_modified() {
        println!("{}", "Changes applied and saved!".green());
    }
}
