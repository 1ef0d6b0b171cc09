use crate::models::{Transaction, UNCATEGORIZED};
use crate::rules::RuleStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyReport {
    pub categorized: usize,
    pub uncategorized: usize,
}

/// Recompute every transaction's category from the rules.
///
/// Prior assignments, including manual ones, are discarded; corrections
/// survive only through the keywords learned when they were made. Rows
/// without details stay `Uncategorized`.
pub fn classify(transactions: &[Transaction], rules: &RuleStore) -> (Vec<Transaction>, ClassifyReport) {
    let mut categorized = 0usize;
    let mut uncategorized = 0usize;

    let out = transactions
        .iter()
        .map(|txn| {
            let category = txn
                .details
                .as_deref()
                .and_then(|details| rules.match_category(details))
                .unwrap_or(UNCATEGORIZED);
            if category == UNCATEGORIZED {
                uncategorized += 1;
            } else {
                categorized += 1;
            }
            Transaction {
                category: category.to_string(),
                ..txn.clone()
            }
        })
        .collect();

    (
        out,
        ClassifyReport {
            categorized,
            uncategorized,
        },
    )
}
