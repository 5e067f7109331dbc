use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A value written back to the sheet. Serialized untagged, so a payload row
/// is a plain JSON array of strings and numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

// ---------------------------------------------------------------------------
// Validated series
// ---------------------------------------------------------------------------

/// 0-based positions of the required labels within the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderColumns {
    pub date: usize,
    pub visitors: usize,
}

/// One data row that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyVisits {
    pub date: NaiveDate,
    pub visitors: u64,
}

/// A gap-free daily series in strictly increasing date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSeries {
    pub columns: HeaderColumns,
    pub rows: Vec<DailyVisits>,
}

impl ValidatedSeries {
    /// Number of data rows (header excluded).
    pub fn data_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn visitor_counts(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.visitors).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}
