// Application settings
// Loaded from ~/.config/visitrend/settings.toml

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_SHEET: &str = "Sheet1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum SettingsError {
    /// Explicitly requested settings file does not exist.
    NotFound(PathBuf),
    /// File exists but could not be read.
    Io { path: PathBuf, message: String },
    /// TOML parse / deserialization error.
    Parse { path: PathBuf, message: String },
    /// Parsed, but a value is out of range.
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "settings file not found: {}", path.display()),
            Self::Io { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "invalid settings in {}: {message}", path.display()),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Spreadsheet to operate on (the id in the sheet's URL).
    pub spreadsheet_id: Option<String>,
    /// Authorized-user OAuth credentials JSON.
    pub credentials_path: Option<PathBuf>,
    pub api_base: String,
    pub token_url: String,
    pub default_sheet: String,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials_path: None,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            default_sheet: DEFAULT_SHEET.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("visitrend")
            .join("settings.toml")
    }

    /// Load settings.
    ///
    /// An explicit path must exist. The default path is optional: when it
    /// is missing the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(SettingsError::NotFound(path.to_path_buf()));
                }
                Self::from_path(path)
            }
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    log::debug!("no settings file at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                Self::from_path(&path)
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = Self::from_toml(&contents).map_err(|e| match e {
            SettingsError::Parse { message, .. } => SettingsError::Parse { path: path.to_path_buf(), message },
            other => other,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(input: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(input).map_err(|e| SettingsError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout_secs == 0 {
            return Err(SettingsError::Invalid("timeout_secs must be at least 1".into()));
        }
        for (key, value) in [("api_base", &self.api_base), ("token_url", &self.token_url)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(SettingsError::Invalid(format!("{key} must be an http(s) URL, got '{value}'")));
            }
        }
        if self.default_sheet.is_empty() {
            return Err(SettingsError::Invalid("default_sheet must not be empty".into()));
        }
        // Empty string in the file means "not set".
        if self.spreadsheet_id.as_deref() == Some("") {
            return Err(SettingsError::Invalid("spreadsheet_id must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_base, "https://sheets.googleapis.com");
        assert_eq!(settings.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(settings.default_sheet, "Sheet1");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.spreadsheet_id.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
spreadsheet_id = "1AbCdEf"
default_sheet = "Daily Visits"
credentials_path = "/home/me/.config/gcloud/application_default_credentials.json"
"#,
        )
        .unwrap();
        assert_eq!(settings.spreadsheet_id.as_deref(), Some("1AbCdEf"));
        assert_eq!(settings.default_sheet, "Daily Visits");
        assert_eq!(
            settings.credentials_path,
            Some(PathBuf::from("/home/me/.config/gcloud/application_default_credentials.json"))
        );
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = Settings::from_toml("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }), "{err}");
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(matches!(Settings::from_toml("timeout_secs = 0"), Err(SettingsError::Invalid(_))));
        assert!(matches!(
            Settings::from_toml("api_base = \"sheets.googleapis.com\""),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(Settings::from_toml("default_sheet = \"\""), Err(SettingsError::Invalid(_))));
        assert!(matches!(Settings::from_toml("spreadsheet_id = \"\""), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base = \"http://127.0.0.1:8080\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.api_base, "http://127.0.0.1:8080");
        assert_eq!(settings.timeout_secs, 5);
    }

    #[test]
    fn parse_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml").unwrap();
        let err = Settings::from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()), "{err}");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(Settings::load(Some(&path)), Err(SettingsError::NotFound(_))));
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        let path = Settings::config_path();
        assert!(path.ends_with("visitrend/settings.toml"));
    }
}
