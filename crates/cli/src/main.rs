// visitrend - trailing moving average of daily visitors in a Google Sheet

mod exit_codes;
mod resolve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use visitrend_config::Settings;
use visitrend_engine::{JobError, JobReport};
use visitrend_sheets::{build_http, resolve_access_token, ClientOptions, SheetsClient, SheetsError};

use exit_codes::{job_exit_code, sheets_exit_code, EXIT_NOT_AUTH, EXIT_SUCCESS};

const START_MESSAGE: &str = "Starting to calculate moving averages...";
const SUCCESS_MESSAGE: &str = "Moving averages calculated and updated successfully.";

#[derive(Parser, Debug)]
#[command(name = "visitrend")]
#[command(about = "Compute a trailing moving average of daily visitors and write it back to the sheet")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
The sheet needs a header row with \"Date\" and \"Visitors\" and one row per
consecutive day below it. Averages are written to the \"Moving Average\"
column (created as column C when missing); the first window-1 rows stay empty.

Examples:
  visitrend --spreadsheet-id 1AbC... --window-size 7
  visitrend --sheet-name 'Daily Visits' --window-size 28 --dry-run
  GOOGLE_SHEETS_ACCESS_TOKEN=$(gcloud auth print-access-token) visitrend
  visitrend --credentials ~/.config/gcloud/application_default_credentials.json --strict-exit")]
pub struct Cli {
    /// Sheet (tab) to read [default: Sheet1, or default_sheet from settings]
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// Trailing window in days [default: all data rows]
    #[arg(long, allow_negative_numbers = true)]
    pub window_size: Option<i64>,

    /// Spreadsheet id (from the sheet's URL)
    #[arg(long, env = "VISITREND_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// OAuth access token
    #[arg(long, env = "GOOGLE_SHEETS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Authorized-user credentials JSON, exchanged for an access token
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Settings file [default: <config dir>/visitrend/settings.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sheets API base URL
    #[arg(long, hide = true)]
    pub api_base: Option<String>,

    /// Compute and plan the write-back without changing the sheet
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero on failure (see exit codes in the documentation)
    #[arg(long)]
    pub strict_exit: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Only print errors
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  visitrend-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn job(err: JobError) -> Self {
        log::warn!("job failed [{}]: {}", err.kind(), err);
        let hint = match &err {
            JobError::InvalidData(reason) => Some(reason.to_string()),
            JobError::InvalidWindow { window, data_rows } => {
                Some(format!("window {window} must be between 1 and {data_rows} (data rows)"))
            }
            JobError::Transport(_) => Some("transient failure; rerun later".into()),
            _ => None,
        };
        Self { code: job_exit_code(&err), message: err.to_string(), hint }
    }

    fn sheets(err: SheetsError) -> Self {
        let hint = match &err {
            SheetsError::NotAuthenticated(_) => {
                Some("set GOOGLE_SHEETS_ACCESS_TOKEN or point --credentials at an authorized-user JSON".into())
            }
            _ => None,
        };
        Self { code: sheets_exit_code(&err), message: err.to_string(), hint }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<JobReport, CliError> {
    let settings = Settings::load(cli.config.as_deref()).map_err(|e| CliError {
        code: EXIT_NOT_AUTH,
        message: e.to_string(),
        hint: None,
    })?;
    let opts = resolve::resolve(cli, settings)?;
    log::debug!(
        "spreadsheet {}, sheet {:?}, window {:?}, api {}",
        opts.spreadsheet_id,
        opts.job.sheet_name,
        opts.job.window,
        opts.api_base
    );

    let http = build_http(opts.timeout).map_err(CliError::sheets)?;
    let token = resolve_access_token(
        opts.access_token.as_deref(),
        opts.credentials.as_deref(),
        &http,
        &opts.token_url,
    )
    .map_err(CliError::sheets)?;

    let client_options = ClientOptions {
        api_base: opts.api_base.clone(),
        timeout: opts.timeout,
        ..ClientOptions::default()
    };
    let mut client =
        SheetsClient::new(&opts.spreadsheet_id, &token, &client_options).map_err(CliError::sheets)?;

    visitrend_engine::run(&mut client, &opts.job).map_err(CliError::job)
}

fn print_dry_run(report: &JobReport) {
    let plan = &report.plan;
    println!(
        "Dry run: {} moving averages (window {}, {} data rows) would be written to {}.",
        plan.values.len(),
        report.window,
        report.data_rows,
        plan.update,
    );
    if let Some(ref header) = plan.header_write {
        println!("Dry run: header \"{}\" would be created at {}.", visitrend_engine::MOVING_AVERAGE_HEADER, header);
    }
    println!("Dry run: {} would be cleared first.", plan.clear);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if !cli.quiet {
        println!("{START_MESSAGE}");
    }

    match run(&cli) {
        Ok(report) => {
            log::info!(
                "{}: {} averages for {:?}..{:?}",
                report.sheet,
                report.averages.len(),
                report.first_date,
                report.last_date
            );
            if report.written {
                if !cli.quiet {
                    println!("{SUCCESS_MESSAGE}");
                }
            } else {
                print_dry_run(&report);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(CliError { code, message, hint }) => {
            println!("Error: {}", message);
            if let Some(hint) = hint {
                if !cli.quiet {
                    eprintln!("hint:  {}", hint);
                }
            }
            if cli.strict_exit {
                ExitCode::from(code)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            }
        }
    }
}
