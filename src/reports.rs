use std::collections::HashMap;

use crate::models::{Direction, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentsSummary {
    pub count: usize,
    pub total: f64,
}

/// Debits grouped by category, largest total first.
pub fn expense_summary(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, (usize, f64)> = HashMap::new();
    for txn in transactions.iter().filter(|t| t.direction == Direction::Debit) {
        let entry = by_category.entry(txn.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += txn.amount;
    }
    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(name, (count, total))| CategoryTotal {
            name: name.to_string(),
            count,
            total,
        })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    totals
}

pub fn payments_summary(transactions: &[Transaction]) -> PaymentsSummary {
    transactions
        .iter()
        .filter(|t| t.direction == Direction::Credit)
        .fold(PaymentsSummary::default(), |acc, t| PaymentsSummary {
            count: acc.count + 1,
            total: acc.total + t.amount,
        })
}
