//! Write-back planning.
//!
//! A plan is computed purely from the existing header row, the window and
//! the averages, then executed against a [`SheetStore`] in a fixed order:
//! header cell (only if missing), clear of every data row in the target
//! column, update of the rows that have an average. Clearing the full
//! column span first means a rerun with a larger window leaves no stale
//! values below the header.

use crate::a1::{column_letter, A1Range};
use crate::model::CellValue;
use crate::store::SheetStore;

pub const MOVING_AVERAGE_HEADER: &str = "Moving Average";

/// Column used when the header has no "Moving Average" label yet (C).
pub const DEFAULT_TARGET_COLUMN: usize = 2;

/// Sheet row of the first data row (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteBackPlan {
    /// 0-based target column.
    pub column: usize,
    /// Header cell to create; `None` when the label already exists.
    pub header_write: Option<A1Range>,
    pub clear: A1Range,
    pub update: A1Range,
    /// One single-cell row per average, top to bottom.
    pub values: Vec<Vec<CellValue>>,
}

/// Build the write-back plan.
///
/// Requires `1 <= window <= data_rows` and
/// `averages.len() == data_rows - window + 1`, which the moving-average
/// engine guarantees for any window it accepts.
pub fn plan(
    sheet: &str,
    existing_header: &[String],
    window: usize,
    data_rows: usize,
    averages: &[f64],
) -> WriteBackPlan {
    debug_assert!(window >= 1 && window <= data_rows);
    debug_assert_eq!(averages.len(), data_rows + 1 - window);

    let existing = existing_header.iter().position(|h| h == MOVING_AVERAGE_HEADER);
    let column = existing.unwrap_or(DEFAULT_TARGET_COLUMN);
    let header_write = match existing {
        Some(_) => None,
        None => Some(A1Range::cell(sheet, column, 1)),
    };

    let last_row = data_rows + 1;
    let clear = A1Range::column_span(sheet, column, FIRST_DATA_ROW, last_row);
    let update = A1Range::column_span(sheet, column, window + 1, last_row);
    let values = averages.iter().map(|&avg| vec![CellValue::Number(avg)]).collect();

    let plan = WriteBackPlan { column, header_write, clear, update, values };
    log::debug!(
        "write-back plan: column {}, header {}, clear {}, update {} ({} values)",
        plan.column_letter(),
        if plan.creates_header() { "created" } else { "kept" },
        plan.clear,
        plan.update,
        plan.values.len(),
    );
    plan
}

impl WriteBackPlan {
    pub fn column_letter(&self) -> String {
        column_letter(self.column)
    }

    pub fn creates_header(&self) -> bool {
        self.header_write.is_some()
    }

    /// Issue the writes: header (if missing), clear, update.
    pub fn execute<S: SheetStore + ?Sized>(&self, store: &mut S) -> Result<(), S::Error> {
        if let Some(ref header) = self.header_write {
            store.write_range(header, &[vec![CellValue::from(MOVING_AVERAGE_HEADER)]])?;
        }
        store.clear_range(&self.clear)?;
        store.write_range(&self.update, &self.values)?;
        Ok(())
    }
}
