use std::fmt;

use chrono::NaiveDate;

/// Why a fetched row set was rejected.
///
/// `row` fields are 1-based sheet row numbers (the header is row 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No rows at all, not even a header.
    Empty,
    /// Header is missing a required label.
    MissingColumn(&'static str),
    /// Header names a required label more than once.
    DuplicateColumn(&'static str),
    /// Data row does not have exactly two cells.
    CellCount { row: usize, found: usize },
    /// Visitors cell is not a finite, non-negative number.
    Visitors { row: usize, value: String },
    /// Date cell does not parse as a calendar date.
    DateParse { row: usize, value: String },
    /// Date lies after the evaluation date.
    FutureDate { row: usize, date: NaiveDate },
    /// Date is equal to or earlier than the previous row's date.
    NotIncreasing { row: usize, previous: NaiveDate, current: NaiveDate },
    /// Date is later than the previous row's date by more than one day.
    DateGap { row: usize, previous: NaiveDate, current: NaiveDate },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "sheet has no rows"),
            Self::MissingColumn(label) => write!(f, "header is missing column '{label}'"),
            Self::DuplicateColumn(label) => write!(f, "header names column '{label}' more than once"),
            Self::CellCount { row, found } => {
                write!(f, "row {row}: expected 2 cells, found {found}")
            }
            Self::Visitors { row, value } => {
                write!(f, "row {row}: visitors '{value}' is not a non-negative number")
            }
            Self::DateParse { row, value } => write!(f, "row {row}: cannot parse date '{value}'"),
            Self::FutureDate { row, date } => write!(f, "row {row}: date {date} is in the future"),
            Self::NotIncreasing { row, previous, current } => {
                write!(f, "row {row}: date {current} does not follow {previous}")
            }
            Self::DateGap { row, previous, current } => {
                write!(f, "row {row}: gap between {previous} and {current}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Terminal failure of a moving-average run.
///
/// `Display` renders the single human-readable message reported to the
/// user; the detail (validation reason, window bounds) is kept for logs.
#[derive(Debug, Clone, PartialEq)]
pub enum JobError {
    /// Requested sheet is not in the spreadsheet's sheet list.
    SheetNotFound(String),
    /// Fetched rows failed header/row validation.
    InvalidData(ValidationError),
    /// Window is not positive or exceeds the number of data rows.
    InvalidWindow { window: i64, data_rows: usize },
    /// Sheet store read/write failure, opaque to the engine.
    Transport(String),
}

impl JobError {
    /// Transport failures may succeed on the next scheduled run; everything
    /// else needs the sheet or the options fixed first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SheetNotFound(_) => "sheet_not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::InvalidWindow { .. } => "invalid_window",
            Self::Transport(_) => "transport",
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SheetNotFound(name) => write!(f, "Sheet with name \"{name}\" does not exist."),
            Self::InvalidData(_) => write!(f, "Invalid Data."),
            Self::InvalidWindow { .. } => write!(f, "Invalid data or window size."),
            Self::Transport(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidData(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<ValidationError> for JobError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidData(err)
    }
}
