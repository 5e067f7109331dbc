//! Row validation for fetched Date/Visitors data.
//!
//! A row set is accepted only as a whole: the header must name both
//! required columns, and every data row must carry a parseable, non-future
//! date exactly one day after its predecessor plus a non-negative visitor
//! count. The first failing row decides the rejection reason.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::error::ValidationError;
use crate::model::{DailyVisits, HeaderColumns, ValidatedSeries};

pub const DATE_HEADER: &str = "Date";
pub const VISITORS_HEADER: &str = "Visitors";

/// Cells per data row. The fetch covers exactly the Date and Visitors columns.
pub const CELLS_PER_ROW: usize = 2;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Validate against the local current date.
pub fn validate(rows: &[Vec<String>]) -> Result<ValidatedSeries, ValidationError> {
    validate_at(rows, Local::now().date_naive())
}

/// Validate with an explicit evaluation date; dates after `today` are rejected.
pub fn validate_at(rows: &[Vec<String>], today: NaiveDate) -> Result<ValidatedSeries, ValidationError> {
    let (header, data) = rows.split_first().ok_or(ValidationError::Empty)?;
    let columns = locate_columns(header)?;

    let mut parsed: Vec<DailyVisits> = Vec::with_capacity(data.len());
    for (i, cells) in data.iter().enumerate() {
        let row = i + 2;

        if cells.len() != CELLS_PER_ROW {
            return Err(ValidationError::CellCount { row, found: cells.len() });
        }

        // A header wider than the data leaves a label without a cell.
        let raw_visitors = cells.get(columns.visitors).map(String::as_str).unwrap_or("");
        let visitors = parse_visitors(raw_visitors)
            .ok_or_else(|| ValidationError::Visitors { row, value: raw_visitors.to_string() })?;

        let raw_date = cells.get(columns.date).map(String::as_str).unwrap_or("");
        let date = parse_date(raw_date)
            .ok_or_else(|| ValidationError::DateParse { row, value: raw_date.to_string() })?;
        if date > today {
            return Err(ValidationError::FutureDate { row, date });
        }

        if let Some(prev) = parsed.last() {
            if date <= prev.date {
                return Err(ValidationError::NotIncreasing { row, previous: prev.date, current: date });
            }
            if (date - prev.date).num_days() != 1 {
                return Err(ValidationError::DateGap { row, previous: prev.date, current: date });
            }
        }

        parsed.push(DailyVisits { date, visitors });
    }

    Ok(ValidatedSeries { columns, rows: parsed })
}

/// Find "Date" and "Visitors" by exact, case-sensitive label.
pub fn locate_columns(header: &[String]) -> Result<HeaderColumns, ValidationError> {
    Ok(HeaderColumns {
        date: find_unique(header, DATE_HEADER)?,
        visitors: find_unique(header, VISITORS_HEADER)?,
    })
}

fn find_unique(header: &[String], label: &'static str) -> Result<usize, ValidationError> {
    let mut positions = header.iter().enumerate().filter(|(_, h)| h.as_str() == label).map(|(i, _)| i);
    let first = positions.next().ok_or(ValidationError::MissingColumn(label))?;
    if positions.next().is_some() {
        return Err(ValidationError::DuplicateColumn(label));
    }
    Ok(first)
}

/// Parse a visitor count. Accepts integer, decimal and exponent notation;
/// fractional counts are truncated toward zero. Counts that do not fit a
/// `u64` are rejected.
pub fn parse_visitors(s: &str) -> Option<u64> {
    let value: f64 = s.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 || value >= u64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as u64)
}

/// Parse a calendar date. Date-time values keep only their date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
