//! A1 notation for sheet ranges.
//!
//! Columns are 0-based internally (0 -> A), rows are 1-based sheet rows
//! (the header is row 1), matching what the spreadsheet shows.

use std::fmt;

/// Convert 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letter(col: usize) -> String {
    let mut result = String::new();
    let mut c = col;
    loop {
        result.insert(0, (b'A' + (c % 26) as u8) as char);
        if c < 26 {
            break;
        }
        c = c / 26 - 1;
    }
    result
}

/// Parse column letters back to a 0-based index. Case-insensitive.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        n = n.checked_mul(26)?.checked_add((ch.to_ascii_uppercase() as u8 - b'A') as usize + 1)?;
    }
    Some(n - 1)
}

/// Sheet names that are plain identifiers are written bare; anything else
/// is single-quoted with embedded quotes doubled.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !looks_like_cell_ref(name);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

// "AB12" would be read as a cell, not a sheet.
fn looks_like_cell_ref(name: &str) -> bool {
    let split = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
    let (letters, digits) = name.split_at(split);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && column_index(letters).is_some_and(|c| c < 18_278)
}

/// The cells a range covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Whole columns, e.g. `A:B`.
    Columns { first: usize, last: usize },
    /// Whole rows, e.g. `1:1`.
    Rows { first: usize, last: usize },
    /// A rectangular block, e.g. `C2:C9`.
    Cells { first_col: usize, first_row: usize, last_col: usize, last_row: usize },
}

/// A range on a named sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub span: Span,
}

impl A1Range {
    pub fn columns(sheet: &str, first: usize, last: usize) -> Self {
        Self { sheet: sheet.to_string(), span: Span::Columns { first, last } }
    }

    pub fn row(sheet: &str, row: usize) -> Self {
        Self { sheet: sheet.to_string(), span: Span::Rows { first: row, last: row } }
    }

    pub fn cell(sheet: &str, col: usize, row: usize) -> Self {
        Self::column_span(sheet, col, row, row)
    }

    /// Rows `first_row..=last_row` of a single column.
    pub fn column_span(sheet: &str, col: usize, first_row: usize, last_row: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            span: Span::Cells { first_col: col, first_row, last_col: col, last_row },
        }
    }

    /// Number of rows covered, if the range is bounded vertically.
    pub fn row_count(&self) -> Option<usize> {
        match self.span {
            Span::Columns { .. } => None,
            Span::Rows { first, last } => Some(last + 1 - first),
            Span::Cells { first_row, last_row, .. } => Some(last_row + 1 - first_row),
        }
    }

    /// The range without its sheet prefix.
    pub fn local(&self) -> String {
        match self.span {
            Span::Columns { first, last } => {
                format!("{}:{}", column_letter(first), column_letter(last))
            }
            Span::Rows { first, last } => format!("{first}:{last}"),
            Span::Cells { first_col, first_row, last_col, last_row } => {
                if first_col == last_col && first_row == last_row {
                    format!("{}{}", column_letter(first_col), first_row)
                } else {
                    format!(
                        "{}{}:{}{}",
                        column_letter(first_col),
                        first_row,
                        column_letter(last_col),
                        last_row
                    )
                }
            }
        }
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", quote_sheet_name(&self.sheet), self.local())
    }
}
