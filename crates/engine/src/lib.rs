//! `visitrend-engine`: daily visitor series validation and moving averages.
//!
//! Pure engine crate: the spreadsheet is reached only through the
//! [`SheetStore`] capability trait. No HTTP, CLI or credential handling.

pub mod a1;
pub mod error;
pub mod job;
pub mod model;
pub mod moving_average;
pub mod plan;
pub mod store;
pub mod validate;

pub use a1::A1Range;
pub use error::{JobError, ValidationError};
pub use job::{run, run_at, JobConfig, JobPhase, JobReport, WindowSize, DEFAULT_SHEET_NAME};
pub use model::{CellValue, DailyVisits, HeaderColumns, ValidatedSeries};
pub use plan::{plan, WriteBackPlan, MOVING_AVERAGE_HEADER};
pub use store::{MemoryStore, MemoryStoreError, SheetStore, StoreOp};
pub use validate::{validate, validate_at};
