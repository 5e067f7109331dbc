//! The moving-average job: fetch, validate, compute, write back.
//!
//! ```text
//! Idle -> Fetching -> Validating -> Computing -> WritingBack -> Done
//! ```
//!
//! Any step can fail; the first failure ends the run with a [`JobError`].
//! The sheet's presence is checked before any range is read.

use std::fmt;

use chrono::NaiveDate;

use crate::a1::A1Range;
use crate::error::JobError;
use crate::moving_average::moving_averages;
use crate::plan::{plan, WriteBackPlan};
use crate::store::SheetStore;
use crate::validate::{validate_at, DATE_HEADER, VISITORS_HEADER};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Requested trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSize {
    /// One window spanning every data row.
    #[default]
    AllRows,
    /// Explicit size as given by the caller, not yet checked.
    Fixed(i64),
}

impl WindowSize {
    /// Concrete window for a series of `data_rows` rows.
    pub fn resolve(self, data_rows: usize) -> Result<usize, JobError> {
        let window = match self {
            WindowSize::AllRows => data_rows as i64,
            WindowSize::Fixed(w) => w,
        };
        if window <= 0 || window as u64 > data_rows as u64 {
            return Err(JobError::InvalidWindow { window, data_rows });
        }
        Ok(window as usize)
    }
}

impl From<Option<i64>> for WindowSize {
    fn from(w: Option<i64>) -> Self {
        w.map_or(WindowSize::AllRows, WindowSize::Fixed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub sheet_name: String,
    pub window: WindowSize,
    /// Plan the write-back but do not issue it.
    pub dry_run: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { sheet_name: DEFAULT_SHEET_NAME.to_string(), window: WindowSize::AllRows, dry_run: false }
    }
}

impl JobConfig {
    pub fn new(sheet_name: Option<&str>, window: Option<i64>) -> Self {
        Self {
            sheet_name: sheet_name.unwrap_or(DEFAULT_SHEET_NAME).to_string(),
            window: window.into(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Fetching,
    Validating,
    Computing,
    WritingBack,
    Done,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Fetching => "fetching",
            JobPhase::Validating => "validating",
            JobPhase::Computing => "computing",
            JobPhase::WritingBack => "writing back",
            JobPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub sheet: String,
    pub window: usize,
    pub data_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub averages: Vec<f64>,
    pub plan: WriteBackPlan,
    /// False for a dry run.
    pub written: bool,
}

impl JobReport {
    pub fn header_created(&self) -> bool {
        self.written && self.plan.creates_header()
    }
}

struct Phases(JobPhase);

impl Phases {
    fn enter(&mut self, next: JobPhase) {
        log::debug!("job: {} -> {}", self.0, next);
        self.0 = next;
    }
}

fn transport<E: std::error::Error>(err: E) -> JobError {
    JobError::Transport(err.to_string())
}

/// Run the job against `store`, treating the local date as today.
pub fn run<S: SheetStore + ?Sized>(store: &mut S, config: &JobConfig) -> Result<JobReport, JobError> {
    run_at(store, config, chrono::Local::now().date_naive())
}

/// Run the job with an explicit evaluation date for the future-date rule.
pub fn run_at<S: SheetStore + ?Sized>(
    store: &mut S,
    config: &JobConfig,
    today: NaiveDate,
) -> Result<JobReport, JobError> {
    let mut phase = Phases(JobPhase::Idle);
    let sheet = config.sheet_name.as_str();

    phase.enter(JobPhase::Fetching);
    let names = store.sheet_names().map_err(transport)?;
    if !names.iter().any(|n| n == sheet) {
        return Err(JobError::SheetNotFound(sheet.to_string()));
    }
    let rows = store.read_range(&A1Range::columns(sheet, 0, 1)).map_err(transport)?;
    log::debug!("fetched {} rows from {}!A:B", rows.len(), sheet);

    phase.enter(JobPhase::Validating);
    let series = validate_at(&rows, today).map_err(|reason| {
        log::warn!(
            "sheet {sheet:?} rejected: {reason} (expected a '{DATE_HEADER}'/'{VISITORS_HEADER}' header and one row per consecutive day)"
        );
        JobError::from(reason)
    })?;

    phase.enter(JobPhase::Computing);
    let data_rows = series.data_rows();
    let window = config.window.resolve(data_rows).inspect_err(|_| {
        log::warn!("window {:?} does not fit {} data rows", config.window, data_rows);
    })?;
    let averages = moving_averages(&series.visitor_counts(), window)?;

    phase.enter(JobPhase::WritingBack);
    let header = store.read_range(&A1Range::row(sheet, 1)).map_err(transport)?;
    let existing_header = header.into_iter().next().unwrap_or_default();
    let plan = plan(sheet, &existing_header, window, data_rows, &averages);
    let written = if config.dry_run {
        log::info!("dry run: skipping write-back to {}", plan.update);
        false
    } else {
        plan.execute(store).map_err(transport)?;
        true
    };

    phase.enter(JobPhase::Done);
    Ok(JobReport {
        sheet: sheet.to_string(),
        window,
        data_rows,
        first_date: series.first_date(),
        last_date: series.last_date(),
        averages,
        plan,
        written,
    })
}
