//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of `visitrend`.
//!
//! By default every run exits 0, including failed ones: the outcome is the
//! `Error: <message>` line on stdout. `--strict-exit` switches to the
//! codes below so schedulers can tell failures apart.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success (or any outcome without `--strict-exit`)           |
//! | 2    | CLI usage error (bad args; reported by clap)               |
//! | 10   | Sheet not found                                            |
//! | 11   | Invalid data (header or rows rejected)                     |
//! | 12   | Invalid window size                                        |
//! | 20   | Transport failure (network, HTTP, rate limit); retryable   |
//! | 21   | Not authenticated, or configuration incomplete/invalid     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant with the others in its range
//! 2. Document what triggers it
//! 3. Update the table above and `job_exit_code` / `sheets_exit_code`

use visitrend_engine::JobError;
use visitrend_sheets::SheetsError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Job (10-19)
// =============================================================================

/// Requested sheet is not in the spreadsheet.
pub const EXIT_SHEET_NOT_FOUND: u8 = 10;

/// Header or data rows failed validation.
pub const EXIT_INVALID_DATA: u8 = 11;

/// Window is not positive or exceeds the number of data rows.
pub const EXIT_INVALID_WINDOW: u8 = 12;

// =============================================================================
// Access (20-29)
// =============================================================================

/// Network error, HTTP error, or rate limit after retries.
/// A later run may succeed without changes.
pub const EXIT_TRANSPORT: u8 = 20;

/// No usable credentials, or settings missing/invalid.
pub const EXIT_NOT_AUTH: u8 = 21;

pub fn job_exit_code(err: &JobError) -> u8 {
    match err {
        JobError::SheetNotFound(_) => EXIT_SHEET_NOT_FOUND,
        JobError::InvalidData(_) => EXIT_INVALID_DATA,
        JobError::InvalidWindow { .. } => EXIT_INVALID_WINDOW,
        JobError::Transport(_) => EXIT_TRANSPORT,
    }
}

pub fn sheets_exit_code(err: &SheetsError) -> u8 {
    match err {
        SheetsError::NotAuthenticated(_) | SheetsError::Io(_) | SheetsError::Parse(_) => EXIT_NOT_AUTH,
        SheetsError::Network(_) | SheetsError::Http(..) => EXIT_TRANSPORT,
    }
}
