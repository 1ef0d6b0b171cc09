use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cleaner::{clean, read_table};
use crate::error::{PennyError, Result};
use crate::models::Transaction;

/// Dates are always written in ISO form so a reload is locale independent.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const COLUMNS: [&str; 5] = ["Date", "Details", "Amount", "Debit/Credit", "Category"];

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A fully written temp file waiting to be renamed over its target.
/// Dropping it without [`StagedWrite::commit`] removes the temp file.
#[derive(Debug)]
pub struct StagedWrite {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Write `bytes` to a sibling temp file of `path` without touching `path`.
pub fn stage(path: &Path, bytes: &[u8]) -> Result<StagedWrite> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let staged = StagedWrite {
        tmp: tmp_path(path),
        target: path.to_path_buf(),
        committed: false,
    };
    let mut file = fs::File::create(&staged.tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(staged)
}

/// Write to a sibling temp file, then rename over `path`. A failed write
/// leaves the previous file in place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    stage(path, bytes)?.commit()
}

/// Load the saved transaction set. `Ok(None)` when nothing has been saved yet.
pub fn load_transactions(path: &Path, date_formats: &[String]) -> Result<Option<Vec<Transaction>>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = fs::File::open(path)?;
    let table = read_table(std::io::BufReader::new(file))?;
    let (transactions, report) = clean(&table, date_formats);
    if report.dropped > 0 {
        tracing::warn!(
            dropped = report.dropped,
            path = %path.display(),
            "saved transactions contained invalid rows"
        );
    }
    Ok(Some(transactions))
}

pub fn save_transactions(path: &Path, transactions: &[Transaction]) -> Result<()> {
    write_atomic(path, &transactions_csv(transactions)?)
}

/// The transaction store file contents.
pub fn transactions_csv(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(COLUMNS)?;
    for txn in transactions {
        let date = txn.date.format(DATE_FORMAT).to_string();
        let amount = txn.amount.to_string();
        wtr.write_record([
            date.as_str(),
            txn.details.as_deref().unwrap_or(""),
            amount.as_str(),
            txn.direction.as_str(),
            txn.category.as_str(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| PennyError::Other(format!("CSV buffer error: {e}")))
}
