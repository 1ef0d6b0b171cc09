//! Propagates category edits made on the debit view back into the full
//! transaction set and into the rule store.
//!
//! Rows are joined on `(Date, Details)`. The key is not unique: every full-set
//! row sharing it takes the edited category, so duplicate lines on the same
//! day are treated as one transaction.

use tracing::{debug, warn};

use crate::error::{PennyError, Result};
use crate::models::{Transaction, ViewRow, UNCATEGORIZED};
use crate::rules::RuleStore;

/// Editable debit-only projection of the transaction set, holding each row's
/// last-known category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebitView {
    rows: Vec<ViewRow>,
}

impl DebitView {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        Self {
            rows: transactions
                .iter()
                .filter(|t| t.is_debit())
                .map(ViewRow::from)
                .collect(),
        }
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A copy of the rows for an editor to change.
    pub fn to_edit(&self) -> Vec<ViewRow> {
        self.rows.clone()
    }
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub transactions: Vec<Transaction>,
    /// View rows whose category was changed.
    pub changed_rows: usize,
    /// Full-set rows whose category changed as a result.
    pub updated_rows: usize,
    /// Changed view rows with no `(Date, Details)` match in the full set.
    pub skipped_rows: usize,
    /// Categories named by edits that the rule store does not know.
    pub rejected: Vec<String>,
    /// `(category, keyword)` pairs added to the rule store.
    pub learned: Vec<(String, String)>,
    /// `(category, keyword)` pairs removed because a row was moved back to
    /// `Uncategorized`.
    pub forgotten: Vec<(String, String)>,
}

impl Reconciliation {
    /// Whether anything needs to be persisted.
    pub fn is_modified(&self) -> bool {
        self.updated_rows > 0 || self.rules_changed()
    }

    pub fn rules_changed(&self) -> bool {
        !self.learned.is_empty() || !self.forgotten.is_empty()
    }
}

/// Apply `edited` (positionally aligned with `view`) to `full`.
///
/// Only the category of an edited row is read; date and details come from
/// the view. `view` is updated in place and `rules` learns the details of
/// each changed row as a keyword for its new category. A row moved to
/// `Uncategorized` instead drops every keyword that matches its details, so
/// the next classification leaves it there.
pub fn apply_edits(
    view: &mut DebitView,
    edited: &[ViewRow],
    full: &[Transaction],
    rules: &mut RuleStore,
) -> Result<Reconciliation> {
    if edited.len() != view.rows.len() {
        return Err(PennyError::EditShapeMismatch {
            expected: view.rows.len(),
            edited: edited.len(),
        });
    }

    let mut result = Reconciliation {
        transactions: full.to_vec(),
        ..Default::default()
    };

    for (row, edit) in view.rows.iter_mut().zip(edited) {
        let new_category = edit.category.trim();
        if new_category == row.category {
            continue;
        }
        if !rules.contains(new_category) {
            warn!(category = new_category, "edit names an unknown category, ignoring");
            result.rejected.push(new_category.to_string());
            continue;
        }

        row.category = new_category.to_string();
        result.changed_rows += 1;

        let mut matched = false;
        for txn in result.transactions.iter_mut().filter(|t| t.key() == row.key()) {
            matched = true;
            if txn.category != new_category {
                txn.category = new_category.to_string();
                result.updated_rows += 1;
            }
        }
        if !matched {
            debug!(date = %row.date, details = ?row.details, "no matching transaction for edit");
            result.skipped_rows += 1;
        }

        if let Some(details) = row.details.as_deref() {
            if new_category == UNCATEGORIZED {
                let forgotten = rules.forget_matching(details);
                for (category, keyword) in &forgotten {
                    debug!(category = category.as_str(), keyword = keyword.as_str(), "keyword forgotten");
                }
                result.forgotten.extend(forgotten);
            } else if rules.add_keyword(new_category, details) {
                result
                    .learned
                    .push((new_category.to_string(), details.trim().to_string()));
            }
        }
    }

    Ok(result)
}
