//! Application context: owns the rule store and the transaction set, and
//! persists both after every successful mutation.
//!
//! Mutations are computed on copies and only committed once the write to disk
//! succeeds, so an IO failure leaves the in-memory state as it was. A change
//! touching both files stages both temp files before renaming either. The
//! rules file is renamed first; if the transactions rename then fails, the
//! previous rules are written back so the two files stay in agreement.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::classifier::{classify, ClassifyReport};
use crate::cleaner::{clean, read_table, CleanReport};
use crate::error::{PennyError, Result};
use crate::models::{Transaction, ViewRow, UNCATEGORIZED};
use crate::reconciler::{apply_edits, DebitView, Reconciliation};
use crate::rules::{load_rules, rules_json, save_rules, RuleStore};
use crate::settings::Settings;
use crate::store::{load_transactions, save_transactions, stage, transactions_csv};

pub const RULES_FILE: &str = "categories.json";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub rules: PathBuf,
    pub transactions: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            rules: dir.join(RULES_FILE),
            transactions: dir.join(TRANSACTIONS_FILE),
        }
    }
}

#[derive(Debug)]
pub struct ImportResult {
    pub clean: CleanReport,
    pub classify: ClassifyReport,
}

pub struct Session {
    paths: DataPaths,
    date_formats: Vec<String>,
    rules: RuleStore,
    transactions: Vec<Transaction>,
    warnings: Vec<String>,
}

impl Session {
    /// Load the rule store and the saved transactions. A corrupt rules file is
    /// replaced by defaults and a transactions file that cannot be read by an
    /// empty set; both are reported through [`Session::warnings`].
    pub fn open(paths: DataPaths, settings: &Settings) -> Result<Self> {
        let loaded = load_rules(&paths.rules);
        let mut warnings: Vec<String> = loaded.warning.into_iter().collect();
        let rules = loaded.store;

        let mut transactions = match load_transactions(&paths.transactions, &settings.date_formats) {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                let message = format!(
                    "Error loading saved transactions {} ({e}). Starting with no transactions.",
                    paths.transactions.display()
                );
                warn!("{message}");
                warnings.push(message);
                Vec::new()
            }
        };
        let orphaned = reset_unknown_categories(&mut transactions, &rules);
        if orphaned > 0 {
            let message =
                format!("{orphaned} saved transactions had unknown categories and were reset to {UNCATEGORIZED}.");
            warn!("{message}");
            warnings.push(message);
        }

        Ok(Self {
            paths,
            date_formats: settings.date_formats.clone(),
            rules,
            transactions,
            warnings,
        })
    }

    pub fn open_dir(dir: &Path, settings: &Settings) -> Result<Self> {
        Self::open(DataPaths::in_dir(dir), settings)
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn debit_view(&self) -> DebitView {
        DebitView::from_transactions(&self.transactions)
    }

    pub fn credits(&self) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| !t.is_debit()).collect()
    }

    /// Persist whichever of the two sets changed, then adopt them.
    fn commit(&mut self, transactions: Option<Vec<Transaction>>, rules: Option<RuleStore>) -> Result<()> {
        match (transactions, rules) {
            (Some(transactions), None) => {
                save_transactions(&self.paths.transactions, &transactions)?;
                self.transactions = transactions;
            }
            (None, Some(rules)) => {
                save_rules(&self.paths.rules, &rules)?;
                self.rules = rules;
            }
            (Some(transactions), Some(rules)) => self.commit_both(transactions, rules)?,
            (None, None) => {}
        }
        Ok(())
    }

    fn commit_both(&mut self, transactions: Vec<Transaction>, rules: RuleStore) -> Result<()> {
        let staged_rules = stage(&self.paths.rules, &rules_json(&rules)?)?;
        let staged_transactions = stage(&self.paths.transactions, &transactions_csv(&transactions)?)?;

        staged_rules.commit()?;
        if let Err(e) = staged_transactions.commit() {
            if let Err(restore) = save_rules(&self.paths.rules, &self.rules) {
                warn!("could not restore {}: {restore}", self.paths.rules.display());
            }
            return Err(e);
        }

        self.transactions = transactions;
        self.rules = rules;
        Ok(())
    }

    /// Replace the stored transactions with a classified statement. A schema
    /// error or a statement with no valid rows leaves the store untouched.
    pub fn import<R: Read>(&mut self, reader: R) -> Result<ImportResult> {
        let table = read_table(reader)?;
        let (cleaned, clean_report) = clean(&table, &self.date_formats);
        if cleaned.is_empty() {
            return Err(PennyError::NoValidData);
        }
        let (classified, classify_report) = classify(&cleaned, &self.rules);
        self.commit(Some(classified), None)?;
        info!(
            kept = clean_report.kept,
            dropped = clean_report.dropped,
            categorized = classify_report.categorized,
            "statement imported"
        );
        Ok(ImportResult {
            clean: clean_report,
            classify: classify_report,
        })
    }

    pub fn import_file(&mut self, path: &Path) -> Result<ImportResult> {
        let file = std::fs::File::open(path)?;
        self.import(std::io::BufReader::new(file))
    }

    /// Re-run the rules over the stored transactions.
    pub fn categorize(&mut self) -> Result<ClassifyReport> {
        let (classified, report) = classify(&self.transactions, &self.rules);
        self.commit(Some(classified), None)?;
        Ok(report)
    }

    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let mut rules = self.rules.clone();
        if !rules.add_category(name) {
            return Ok(false);
        }
        self.commit(None, Some(rules))?;
        Ok(true)
    }

    /// Remove a category; its transactions fall back to `Uncategorized`.
    pub fn delete_category(&mut self, name: &str) -> Result<bool> {
        let mut rules = self.rules.clone();
        if !rules.delete_category(name) {
            return Ok(false);
        }
        let mut transactions = self.transactions.clone();
        let moved = reset_unknown_categories(&mut transactions, &rules);
        self.commit((moved > 0).then_some(transactions), Some(rules))?;
        Ok(true)
    }

    pub fn move_category(&mut self, name: &str, position: usize) -> Result<bool> {
        let mut rules = self.rules.clone();
        if !rules.move_category(name, position) {
            return Ok(false);
        }
        self.commit(None, Some(rules))?;
        Ok(true)
    }

    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> Result<bool> {
        let mut rules = self.rules.clone();
        if !rules.add_keyword(category, keyword) {
            return Ok(false);
        }
        self.commit(None, Some(rules))?;
        Ok(true)
    }

    pub fn remove_keyword(&mut self, category: &str, keyword: &str) -> Result<bool> {
        let mut rules = self.rules.clone();
        if !rules.remove_keyword(category, keyword) {
            return Ok(false);
        }
        self.commit(None, Some(rules))?;
        Ok(true)
    }

    /// Reconcile an edited copy of the debit view and persist the result.
    pub fn apply_edits(&mut self, edited: &[ViewRow]) -> Result<Reconciliation> {
        let mut view = self.debit_view();
        let mut rules = self.rules.clone();
        let mut result = apply_edits(&mut view, edited, &self.transactions, &mut rules)?;
        let transactions =
            (result.updated_rows > 0).then(|| std::mem::take(&mut result.transactions));
        let rules = result.rules_changed().then_some(rules);
        self.commit(transactions, rules)?;
        result.transactions = self.transactions.clone();
        Ok(result)
    }

    /// Set the category of the debit rows matching `(date, details)`.
    pub fn edit_matching(
        &mut self,
        date: NaiveDate,
        details: Option<&str>,
        category: &str,
    ) -> Result<Reconciliation> {
        if !self.rules.contains(category) {
            return Err(PennyError::UnknownCategory(category.to_string()));
        }
        let view = self.debit_view();
        let mut edited = view.to_edit();
        let mut found = false;
        for row in edited.iter_mut().filter(|r| r.key() == (date, details)) {
            row.category = category.to_string();
            found = true;
        }
        if !found {
            return Err(PennyError::Other(format!(
                "No debit transaction on {date} with details {:?}",
                details.unwrap_or("")
            )));
        }
        self.apply_edits(&edited)
    }
}

fn reset_unknown_categories(transactions: &mut [Transaction], rules: &RuleStore) -> usize {
    let mut reset = 0;
    for txn in transactions.iter_mut() {
        if !rules.contains(&txn.category) {
            txn.category = UNCATEGORIZED.to_string();
            reset += 1;
        }
    }
    reset
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "Date,Details,Amount,Debit/Credit\n\
        05/01/2024,Big Mart,500,Debit\n\
        05/01/2024,Big Mart,500,Debit\n\
        06/01/2024,Metro Card,120,Debit\n\
        07/01/2024,Salary,90000,Credit\n\
        oops,Broken,1,Debit\n";

    fn open(dir: &Path) -> Session {
        Session::open_dir(dir, &Settings::default()).unwrap()
    }

    #[test]
    fn test_first_run_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let session = open(dir.path());
        assert_eq!(session.rules().categories(), vec![UNCATEGORIZED]);
        assert!(session.transactions().is_empty());
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_import_classifies_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Groceries").unwrap();
        session.add_keyword("Groceries", "big mart").unwrap();

        let result = session.import(STATEMENT.as_bytes()).unwrap();
        assert_eq!(result.clean.kept, 4);
        assert_eq!(result.clean.dropped, 1);
        assert_eq!(result.classify.categorized, 2);

        let reopened = open(dir.path());
        assert_eq!(reopened.transactions(), session.transactions());
        assert_eq!(reopened.rules(), session.rules());
        assert_eq!(reopened.debit_view().len(), 3);
        assert_eq!(reopened.credits().len(), 1);
    }

    #[test]
    fn test_missing_column_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.import(STATEMENT.as_bytes()).unwrap();
        let before = std::fs::read_to_string(&session.paths().transactions).unwrap();

        let bad = "Date,Details,Amount\n2024-02-01,Other,5\n";
        let err = session.import(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, PennyError::MissingColumns(_)));
        assert_eq!(session.transactions().len(), 4);
        let after = std::fs::read_to_string(&session.paths().transactions).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_no_valid_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        let bad = "Date,Details,Amount,Debit/Credit\nnope,x,y,Debit\n";
        let err = session.import(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, PennyError::NoValidData));
        assert!(!session.paths().transactions.exists());
    }

    #[test]
    fn test_edit_propagates_learns_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Groceries").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let result = session
            .edit_matching(date, Some("Big Mart"), "Groceries")
            .unwrap();
        assert_eq!(result.updated_rows, 2);
        assert_eq!(result.learned.len(), 1);

        let reopened = open(dir.path());
        let groceries = reopened
            .transactions()
            .iter()
            .filter(|t| t.category == "Groceries")
            .count();
        assert_eq!(groceries, 2);
        assert_eq!(
            reopened.rules().keywords("Groceries").unwrap(),
            &["Big Mart".to_string()]
        );

        let mut reopened = reopened;
        let fresh = "Date,Details,Amount,Debit/Credit\n2024-03-10,Big Mart,80,Debit\n";
        reopened.import(fresh.as_bytes()).unwrap();
        assert_eq!(reopened.transactions()[0].category, "Groceries");
    }

    #[test]
    fn test_edit_unknown_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.import(STATEMENT.as_bytes()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let err = session
            .edit_matching(date, Some("Big Mart"), "Nope")
            .unwrap_err();
        assert!(matches!(err, PennyError::UnknownCategory(_)));
    }

    #[test]
    fn test_delete_category_resets_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Travel").unwrap();
        session.add_keyword("Travel", "metro").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();
        assert!(session.transactions().iter().any(|t| t.category == "Travel"));

        assert!(session.delete_category("Travel").unwrap());
        assert!(!session.delete_category(UNCATEGORIZED).unwrap());
        assert!(session.transactions().iter().all(|t| t.category == UNCATEGORIZED));
        let reopened = open(dir.path());
        assert!(!reopened.rules().contains("Travel"));
        assert!(reopened.transactions().iter().all(|t| t.category == UNCATEGORIZED));
    }

    #[test]
    fn test_corrupt_rules_warn_and_reset_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Travel").unwrap();
        session.add_keyword("Travel", "metro").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();

        std::fs::write(dir.path().join(RULES_FILE), "{broken").unwrap();
        let reopened = open(dir.path());
        assert_eq!(reopened.warnings().len(), 2);
        assert_eq!(reopened.rules(), &RuleStore::default());
        assert!(reopened.transactions().iter().all(|t| t.category == UNCATEGORIZED));
    }

    #[test]
    fn test_failed_write_preserves_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        // A directory where the rules file should be makes the rename fail.
        std::fs::create_dir_all(dir.path().join(RULES_FILE).join("blocker")).unwrap();
        assert!(session.add_category("Food").is_err());
        assert!(!session.rules().contains("Food"));
    }

    fn block(path: &Path) {
        std::fs::remove_file(path).unwrap();
        std::fs::create_dir_all(path.join("blocker")).unwrap();
    }

    #[test]
    fn test_delete_with_blocked_rules_keeps_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Travel").unwrap();
        session.add_keyword("Travel", "metro").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();
        let before = std::fs::read_to_string(&session.paths().transactions).unwrap();

        block(&session.paths().rules.clone());
        assert!(session.delete_category("Travel").is_err());

        assert!(session.rules().contains("Travel"));
        assert!(session.transactions().iter().any(|t| t.category == "Travel"));
        let after = std::fs::read_to_string(&session.paths().transactions).unwrap();
        assert_eq!(before, after);
        assert!(!dir.path().join("transactions.csv.tmp").exists());
    }

    #[test]
    fn test_edit_with_blocked_transactions_restores_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Groceries").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();
        let rules_before = std::fs::read_to_string(&session.paths().rules).unwrap();

        block(&session.paths().transactions.clone());
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(session
            .edit_matching(date, Some("Big Mart"), "Groceries")
            .is_err());

        let rules_after = std::fs::read_to_string(&session.paths().rules).unwrap();
        assert_eq!(rules_before, rules_after);
        assert!(session.rules().keywords("Groceries").unwrap().is_empty());
        assert!(session
            .transactions()
            .iter()
            .all(|t| t.category == UNCATEGORIZED));
    }

    #[test]
    fn test_corrupt_transactions_warn_and_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TRANSACTIONS_FILE), "garbage\n1\n").unwrap();

        let mut session = open(dir.path());
        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("Starting with no transactions"));
        assert!(session.transactions().is_empty());

        session.import(STATEMENT.as_bytes()).unwrap();
        assert_eq!(open(dir.path()).transactions().len(), 4);
    }

    #[test]
    fn test_uncategorized_edit_forgets_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.add_category("Travel").unwrap();
        session.add_keyword("Travel", "metro").unwrap();
        session.import(STATEMENT.as_bytes()).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let result = session
            .edit_matching(date, Some("Metro Card"), UNCATEGORIZED)
            .unwrap();
        assert_eq!(result.forgotten, vec![("Travel".to_string(), "metro".to_string())]);

        let mut reopened = open(dir.path());
        assert!(reopened.rules().keywords("Travel").unwrap().is_empty());
        let report = reopened.categorize().unwrap();
        assert_eq!(report.categorized, 0);
    }

    #[test]
    fn test_categorize_reruns_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.import(STATEMENT.as_bytes()).unwrap();
        session.add_category("Travel").unwrap();
        session.add_keyword("Travel", "METRO").unwrap();
        let report = session.categorize().unwrap();
        assert_eq!(report.categorized, 1);
        assert_eq!(report.uncategorized, 3);
    }
}
