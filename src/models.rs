use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "dr" => Ok(Self::Debit),
            "credit" | "cr" => Ok(Self::Credit),
            other => Err(format!("Unknown direction: '{other}'")),
        }
    }
}

/// A validated statement line. Everything downstream of the cleaner works on this.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub details: Option<String>,
    pub amount: f64,
    pub direction: Direction,
    pub category: String,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    /// Natural join key shared by the full set and the debit view.
    pub fn key(&self) -> (NaiveDate, Option<&str>) {
        (self.date, self.details.as_deref())
    }

    /// Back to the untyped shape the cleaner accepts.
    #[cfg(test)]
    pub fn to_raw(&self) -> RawRow {
        RawRow {
            date: self.date.format(crate::store::DATE_FORMAT).to_string(),
            details: self.details.clone(),
            amount: self.amount.to_string(),
            direction: self.direction.as_str().to_string(),
            category: Some(self.category.clone()),
        }
    }
}

/// One statement row as read from a CSV file, before any coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub date: String,
    pub details: Option<String>,
    pub amount: String,
    pub direction: String,
    pub category: Option<String>,
}

/// Rows read from a statement file plus whether it carried a Category column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    pub has_category: bool,
    /// Records skipped because a field was not valid UTF-8.
    pub undecodable: usize,
}

/// Row of the editable debit view: `Date, Details, Amount, Category`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub date: NaiveDate,
    pub details: Option<String>,
    pub amount: f64,
    pub category: String,
}

impl ViewRow {
    pub fn key(&self) -> (NaiveDate, Option<&str>) {
        (self.date, self.details.as_deref())
    }
}

impl From<&Transaction> for ViewRow {
    fn from(txn: &Transaction) -> Self {
        Self {
            date: txn.date,
            details: txn.details.clone(),
            amount: txn.amount,
            category: txn.category.clone(),
        }
    }
}
