//! Statement ingestion: header validation and row normalization.
//!
//! Rows whose amount, date or direction cannot be coerced are dropped, never
//! raised. Only a missing required column rejects a file.

use std::io::Read;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{PennyError, Result};
use crate::models::{Direction, RawRow, RawTable, Transaction, UNCATEGORIZED};
use crate::store::DATE_FORMAT;

pub const REQUIRED_COLUMNS: [&str; 4] = ["Date", "Details", "Amount", "Debit/Credit"];
const CATEGORY_COLUMN: &str = "Category";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a statement amount. Accepts thousands separators, currency markers
/// and accounting-style `(12.50)` negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().replace([',', '"', '$', '₹', '€', '£'], "");
    for marker in ["INR", "Rs.", "Rs"] {
        s = s.replace(marker, "");
    }
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => -inner.trim().parse::<f64>().ok()?,
        None => s.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Parse a date with the store format first, then each configured format.
/// Timestamps such as `2024-01-05 00:00:00` fall back to their date part.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let try_all = |s: &str| {
        std::iter::once(DATE_FORMAT)
            .chain(formats.iter().map(String::as_str))
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    };
    try_all(raw).or_else(|| {
        let head = raw.split(|c: char| c == ' ' || c == 'T').next()?;
        if head.len() == raw.len() {
            return None;
        }
        try_all(head)
    })
}

// ---------------------------------------------------------------------------
// read_table
// ---------------------------------------------------------------------------

struct ColumnMap {
    date: usize,
    details: usize,
    amount: usize,
    direction: usize,
    category: Option<usize>,
}

fn map_columns(headers: &csv::StringRecord) -> Result<ColumnMap> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let found: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(*c)).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip(&found)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    match found.as_slice() {
        [Some(date), Some(details), Some(amount), Some(direction)] => Ok(ColumnMap {
            date: *date,
            details: *details,
            amount: *amount,
            direction: *direction,
            category: find(CATEGORY_COLUMN),
        }),
        _ => Err(PennyError::MissingColumns(missing)),
    }
}

fn decode_row(record: &csv::ByteRecord, cols: &ColumnMap) -> Option<RawRow> {
    let field = |idx: usize| {
        std::str::from_utf8(record.get(idx).unwrap_or_default())
            .ok()
            .map(str::to_string)
    };
    let category = match cols.category {
        Some(idx) => Some(field(idx)?),
        None => None,
    };
    Some(RawRow {
        date: field(cols.date)?,
        details: Some(field(cols.details)?).filter(|d| !d.trim().is_empty()),
        amount: field(cols.amount)?,
        direction: field(cols.direction)?,
        category,
    })
}

/// Read a statement CSV. Headers are matched case-insensitively after
/// trimming; extra columns are ignored. A record with a field that is not
/// valid UTF-8 is skipped like any other bad row.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = map_columns(&headers)?;

    let mut table = RawTable {
        has_category: cols.category.is_some(),
        ..Default::default()
    };
    for result in rdr.byte_records() {
        let record = result?;
        match decode_row(&record, &cols) {
            Some(row) => table.rows.push(row),
            None => {
                debug!(line = record.position().map(|p| p.line()), "dropping row that is not valid UTF-8");
                table.undecodable += 1;
            }
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CleanReport {
    pub kept: usize,
    pub dropped: usize,
}

fn clean_row(row: &RawRow, date_formats: &[String]) -> Option<Transaction> {
    let Some(amount) = parse_amount(&row.amount) else {
        debug!(amount = %row.amount, "dropping row with invalid amount");
        return None;
    };
    let Some(date) = parse_date(&row.date, date_formats) else {
        debug!(date = %row.date, "dropping row with invalid date");
        return None;
    };
    let direction = match row.direction.parse::<Direction>() {
        Ok(d) => d,
        Err(e) => {
            debug!("dropping row: {e}");
            return None;
        }
    };
    let category = row
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNCATEGORIZED)
        .to_string();
    Some(Transaction {
        date,
        details: row.details.clone().filter(|d| !d.trim().is_empty()),
        amount,
        direction,
        category,
    })
}

/// Coerce raw rows into transactions, dropping rows that do not validate.
pub fn clean(table: &RawTable, date_formats: &[String]) -> (Vec<Transaction>, CleanReport) {
    let transactions: Vec<Transaction> = table
        .rows
        .iter()
        .filter_map(|row| clean_row(row, date_formats))
        .collect();
    let report = CleanReport {
        kept: transactions.len(),
        dropped: table.rows.len() - transactions.len() + table.undecodable,
    };
    (transactions, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_date_formats;

    fn table(csv_text: &str) -> RawTable {
        read_table(csv_text.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.50"), Some(1234.5));
        assert_eq!(parse_amount(" $42.10 "), Some(42.10));
        assert_eq!(parse_amount("(12.00)"), Some(-12.0));
        assert_eq!(parse_amount("₹ 500"), Some(500.0));
        assert_eq!(parse_amount("-7"), Some(-7.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = default_date_formats();
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05", &formats), Some(jan5));
        assert_eq!(parse_date("05/01/2024", &formats), Some(jan5));
        assert_eq!(parse_date("05 Jan 2024", &formats), Some(jan5));
        assert_eq!(parse_date("2024-01-05 00:00:00", &formats), Some(jan5));
        assert_eq!(parse_date("31/02/2024", &formats), None);
        assert_eq!(parse_date("yesterday", &formats), None);
    }

    #[test]
    fn test_headers_case_insensitive_and_trimmed() {
        let t = table(" date ,DETAILS, Amount ,debit/credit,Extra\n2024-01-05,Big Mart,500,Debit,x\n");
        assert!(!t.has_category);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].details.as_deref(), Some("Big Mart"));
        assert_eq!(t.rows[0].category, None);
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = read_table("Date,Details,Amount\n2024-01-05,Big Mart,500\n".as_bytes()).unwrap_err();
        match err {
            PennyError::MissingColumns(cols) => assert_eq!(cols, vec!["Debit/Credit"]),
            other => panic!("unexpected error: {other}"),
        }
        let err = read_table("Foo\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PennyError::MissingColumns(ref c) if c.len() == 4));
    }

    #[test]
    fn test_clean_drops_invalid_rows() {
        let t = table(
            "Date,Details,Amount,Debit/Credit\n\
             2024-01-05,Big Mart,500,Debit\n\
             not-a-date,Cafe,20,Debit\n\
             2024-01-06,Cafe,twenty,Debit\n\
             2024-01-07,Salary,90000,Credit\n\
             2024-01-08,Odd,1,Sideways\n",
        );
        let (txns, report) = clean(&t, &default_date_formats());
        assert_eq!(report, CleanReport { kept: 2, dropped: 3 });
        assert_eq!(txns[0].category, UNCATEGORIZED);
        assert_eq!(txns[1].direction, Direction::Credit);
    }

    #[test]
    fn test_invalid_utf8_row_dropped() {
        let bytes: &[u8] = b"Date,Details,Amount,Debit/Credit\n\
            2024-01-05,Caf\xe9 Noir,10,Debit\n\
            2024-01-06,Metro,20,Debit\n";
        let t = read_table(bytes).unwrap();
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.undecodable, 1);
        let (txns, report) = clean(&t, &default_date_formats());
        assert_eq!(report, CleanReport { kept: 1, dropped: 1 });
        assert_eq!(txns[0].details.as_deref(), Some("Metro"));
    }

    #[test]
    fn test_clean_keeps_existing_category_and_blank_details() {
        let t = table(
            "Date,Details,Amount,Debit/Credit,Category\n\
             2024-01-05,,10,Debit,Food\n\
             2024-01-06,Metro,20,Debit,\n",
        );
        assert!(t.has_category);
        let (txns, _) = clean(&t, &default_date_formats());
        assert_eq!(txns[0].details, None);
        assert_eq!(txns[0].category, "Food");
        assert_eq!(txns[1].category, UNCATEGORIZED);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let t = table(
            "Date,Details,Amount,Debit/Credit\n\
             05/01/2024,Big Mart,\"1,500.25\",Debit\n\
             bad,Big Mart,1,Debit\n\
             2024-01-06 10:30:00,  padded  ,(3.5),credit\n\
             07 Jan 2024,,0.1,DR\n",
        );
        let formats = default_date_formats();
        let (once, _) = clean(&t, &formats);
        let again_table = RawTable {
            rows: once.iter().map(Transaction::to_raw).collect(),
            has_category: true,
            undecodable: 0,
        };
        let (twice, report) = clean(&again_table, &formats);
        assert_eq!(report.dropped, 0);
        assert_eq!(once, twice);
    }
}
