//! The spreadsheet capability the engine runs against.
//!
//! [`SheetStore`] is the whole surface the job needs: list sheet titles,
//! read a range, clear a range, write a range with RAW value input.
//! [`MemoryStore`] implements it over an in-memory grid and records every
//! call, which is how the job and planner are tested.

use std::fmt;

use crate::a1::{A1Range, Span};
use crate::model::CellValue;

pub trait SheetStore {
    type Error: std::error::Error;

    /// Titles of every sheet in the spreadsheet.
    fn sheet_names(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Cell text row by row. Trailing empty cells and rows are omitted.
    fn read_range(&mut self, range: &A1Range) -> Result<Vec<Vec<String>>, Self::Error>;

    fn clear_range(&mut self, range: &A1Range) -> Result<(), Self::Error>;

    /// Store `values` literally (no formula or locale interpretation),
    /// starting at the top-left of `range`.
    fn write_range(&mut self, range: &A1Range, values: &[Vec<CellValue>]) -> Result<(), Self::Error>;
}

/// A recorded store call; ranges are kept in A1 notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    ListSheets,
    Read(String),
    Clear(String),
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreError(pub String);

impl fmt::Display for MemoryStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MemoryStoreError {}

/// In-memory spreadsheet: named sheets of string cells.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: Vec<(String, Vec<Vec<String>>)>,
    ops: Vec<StoreOp>,
    fail_reads: Option<String>,
    fail_writes: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet whose first row is row 1.
    pub fn with_sheet(mut self, name: &str, rows: &[&[&str]]) -> Self {
        let grid = rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect();
        self.sheets.push((name.to_string(), grid));
        self
    }

    /// Make every range read fail with `message`.
    pub fn fail_reads(mut self, message: &str) -> Self {
        self.fail_reads = Some(message.to_string());
        self
    }

    /// Make every clear and write fail with `message`.
    pub fn fail_writes(mut self, message: &str) -> Self {
        self.fail_writes = Some(message.to_string());
        self
    }

    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub fn grid(&self, sheet: &str) -> Option<&[Vec<String>]> {
        self.sheets.iter().find(|(n, _)| n == sheet).map(|(_, g)| g.as_slice())
    }

    /// A 1-based cell's text, empty when unset.
    pub fn cell(&self, sheet: &str, col: usize, row: usize) -> &str {
        self.grid(sheet)
            .and_then(|g| g.get(row.wrapping_sub(1)))
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Column text from row 2 down to `last_row`.
    pub fn column_below_header(&self, sheet: &str, col: usize, last_row: usize) -> Vec<String> {
        (2..=last_row).map(|row| self.cell(sheet, col, row).to_string()).collect()
    }

    fn grid_mut(&mut self, sheet: &str) -> Result<&mut Vec<Vec<String>>, MemoryStoreError> {
        self.sheets
            .iter_mut()
            .find(|(n, _)| n == sheet)
            .map(|(_, g)| g)
            .ok_or_else(|| MemoryStoreError(format!("Unable to parse range: {sheet}")))
    }
}

/// Row and column bounds of a span against a grid of `height` rows.
/// Rows are 0-based here; `None` for the last column means unbounded.
fn bounds(span: Span, height: usize) -> (usize, usize, usize, Option<usize>) {
    match span {
        Span::Columns { first, last } => (0, height.max(1) - 1, first, Some(last)),
        Span::Rows { first, last } => (first - 1, last - 1, 0, None),
        Span::Cells { first_col, first_row, last_col, last_row } => {
            (first_row - 1, last_row - 1, first_col, Some(last_col))
        }
    }
}

fn trim_trailing(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    for row in rows.iter_mut() {
        while row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
    }
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

impl SheetStore for MemoryStore {
    type Error = MemoryStoreError;

    fn sheet_names(&mut self) -> Result<Vec<String>, Self::Error> {
        self.ops.push(StoreOp::ListSheets);
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_range(&mut self, range: &A1Range) -> Result<Vec<Vec<String>>, Self::Error> {
        self.ops.push(StoreOp::Read(range.to_string()));
        if let Some(ref msg) = self.fail_reads {
            return Err(MemoryStoreError(msg.clone()));
        }
        let grid = self.grid_mut(&range.sheet)?;
        let (top, bottom, left, right) = bounds(range.span, grid.len());

        let mut out = Vec::new();
        for row in top..=bottom {
            let cells = grid.get(row).map(Vec::as_slice).unwrap_or(&[]);
            let right = right.unwrap_or(cells.len().max(1) - 1);
            out.push((left..=right).map(|c| cells.get(c).cloned().unwrap_or_default()).collect());
        }
        Ok(trim_trailing(out))
    }

    fn clear_range(&mut self, range: &A1Range) -> Result<(), Self::Error> {
        self.ops.push(StoreOp::Clear(range.to_string()));
        if let Some(ref msg) = self.fail_writes {
            return Err(MemoryStoreError(msg.clone()));
        }
        let grid = self.grid_mut(&range.sheet)?;
        let (top, bottom, left, right) = bounds(range.span, grid.len());
        for row in grid.iter_mut().take(bottom + 1).skip(top) {
            let right = right.unwrap_or(row.len().max(1) - 1);
            for cell in row.iter_mut().take(right + 1).skip(left) {
                cell.clear();
            }
        }
        Ok(())
    }

    fn write_range(&mut self, range: &A1Range, values: &[Vec<CellValue>]) -> Result<(), Self::Error> {
        self.ops.push(StoreOp::Write(range.to_string()));
        if let Some(ref msg) = self.fail_writes {
            return Err(MemoryStoreError(msg.clone()));
        }
        if let Some(rows) = range.row_count() {
            if values.len() > rows {
                return Err(MemoryStoreError(format!(
                    "Requested writing within range [{range}], but tried writing to row [{}]",
                    values.len()
                )));
            }
        }
        let grid = self.grid_mut(&range.sheet)?;
        let (top, _, left, _) = bounds(range.span, grid.len());
        for (r, row_values) in values.iter().enumerate() {
            let row = top + r;
            if grid.len() <= row {
                grid.resize(row + 1, Vec::new());
            }
            let cells = &mut grid[row];
            for (c, value) in row_values.iter().enumerate() {
                let col = left + c;
                if cells.len() <= col {
                    cells.resize(col + 1, String::new());
                }
                cells[col] = value.to_string();
            }
        }
        Ok(())
    }
}
