//! Merge command-line flags with the settings file.
//!
//! Precedence: flag (or its environment variable, via clap) > settings
//! file > built-in default.

use std::path::PathBuf;
use std::time::Duration;

use visitrend_config::Settings;
use visitrend_engine::JobConfig;

use crate::exit_codes::{EXIT_NOT_AUTH, EXIT_USAGE};
use crate::{Cli, CliError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub spreadsheet_id: String,
    pub access_token: Option<String>,
    pub credentials: Option<PathBuf>,
    pub api_base: String,
    pub token_url: String,
    pub timeout: Duration,
    pub job: JobConfig,
}

pub fn resolve(cli: &Cli, settings: Settings) -> Result<RunOptions, CliError> {
    if cli.sheet_name.as_deref() == Some("") {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "sheet name must not be empty".into(),
            hint: None,
        });
    }

    let spreadsheet_id = cli
        .spreadsheet_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or(settings.spreadsheet_id)
        .ok_or_else(|| CliError {
            code: EXIT_NOT_AUTH,
            message: "no spreadsheet id configured".into(),
            hint: Some(format!(
                "pass --spreadsheet-id, set VISITREND_SPREADSHEET_ID, or add spreadsheet_id to {}",
                Settings::config_path().display()
            )),
        })?;

    let sheet_name = cli.sheet_name.as_deref().unwrap_or(&settings.default_sheet);
    let mut job = JobConfig::new(Some(sheet_name), cli.window_size);
    job.dry_run = cli.dry_run;

    Ok(RunOptions {
        spreadsheet_id,
        access_token: cli.access_token.clone(),
        credentials: cli.credentials.clone().or(settings.credentials_path),
        api_base: cli.api_base.clone().unwrap_or(settings.api_base),
        token_url: settings.token_url,
        timeout: Duration::from_secs(settings.timeout_secs),
        job,
    })
}
