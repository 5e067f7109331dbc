use std::thread;
use std::time::Duration;

use serde::Serialize;
use url::Url;
use visitrend_engine::{A1Range, CellValue, SheetStore};

pub const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("visitrend/", env!("CARGO_PKG_VERSION"));

/// Errors from the Sheets API client
#[derive(Debug)]
pub enum SheetsError {
    /// No usable credentials, or the token could not be minted
    NotAuthenticated(String),
    /// Network error (connect, timeout) after retries
    Network(String),
    /// HTTP error with status code and the API's error message
    Http(u16, String),
    /// Unexpected response shape
    Parse(String),
    /// File I/O error
    Io(String),
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::NotAuthenticated(msg) => write!(f, "Not authenticated: {}", msg),
            SheetsError::Network(msg) => write!(f, "Network error: {}", msg),
            SheetsError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SheetsError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SheetsError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SheetsError {}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the API, e.g. `https://sheets.googleapis.com`.
    pub api_base: String,
    pub timeout: Duration,
    /// First retry delay; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
            backoff: Duration::from_secs(1),
        }
    }
}

/// Blocking HTTP client with the crate's user agent and a request timeout.
pub fn build_http(timeout: Duration) -> Result<reqwest::blocking::Client, SheetsError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SheetsError::Network(format!("failed to build HTTP client: {e}")))
}

fn extract_google_error(body: &serde_json::Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .or_else(|| body["error_description"].as_str())
        .or_else(|| body["error"].as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: String,
    major_dimension: &'static str,
    values: &'a [Vec<CellValue>],
}

/// Client for one spreadsheet.
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: Url,
    spreadsheet_id: String,
    token: String,
    backoff: Duration,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: &str, token: &str, options: &ClientOptions) -> Result<Self, SheetsError> {
        let api_base = Url::parse(&options.api_base)
            .map_err(|e| SheetsError::Parse(format!("invalid API base '{}': {}", options.api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(SheetsError::Parse(format!("invalid API base '{}'", options.api_base)));
        }
        Ok(Self {
            http: build_http(options.timeout)?,
            api_base,
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
            backoff: options.backoff,
        })
    }

    /// `{api_base}/v4/spreadsheets/{id}[/values/{range}{suffix}]`
    fn url(&self, range: Option<(&A1Range, &str)>) -> Url {
        let mut url = self.api_base.clone();
        {
            // Checked in `new`: the base URL can carry path segments.
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("v4").push("spreadsheets").push(&self.spreadsheet_id);
                if let Some((range, suffix)) = range {
                    segments.push("values").push(&format!("{range}{suffix}"));
                }
            }
        }
        url
    }

    /// Send a request with retry + exponential backoff.
    ///
    /// `build_request` is called once per attempt. 429 and 5xx responses
    /// and network errors are retried up to [`MAX_RETRIES`] times; any
    /// other 4xx fails immediately.
    fn request_with_retry(
        &self,
        what: &str,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, SheetsError> {
        let mut backoff = self.backoff;
        let mut attempt = 0u32;

        loop {
            log::debug!("{what} (attempt {})", attempt + 1);
            let result = build_request(&self.http).bearer_auth(&self.token).send();

            let wait = match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Client errors (not 429): fail immediately
                    if (400..500).contains(&status) && status != 429 {
                        let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                        return Err(SheetsError::Http(status, extract_google_error(&body, status)));
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                            return Err(SheetsError::Http(
                                status,
                                format!(
                                    "{} after {} attempts",
                                    extract_google_error(&body, status),
                                    MAX_RETRIES + 1
                                ),
                            ));
                        }

                        // Respect Retry-After header for 429
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.trim().parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                        } else {
                            backoff
                        };
                        log::warn!(
                            "{what}: retry {}/{} in {:?} (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status
                        );
                        wait
                    } else {
                        // Success: read as text first to tolerate a BOM or an empty body
                        let text = resp
                            .text()
                            .map_err(|e| SheetsError::Network(format!("failed to read response body: {e}")))?;
                        let trimmed = text.trim_start_matches('\u{feff}').trim();
                        if trimmed.is_empty() {
                            return Ok(serde_json::Value::Null);
                        }
                        return serde_json::from_str(trimmed).map_err(|e| {
                            SheetsError::Parse(format!(
                                "failed to parse JSON response: {} (body: {})",
                                e,
                                trimmed.chars().take(200).collect::<String>()
                            ))
                        });
                    }
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == MAX_RETRIES {
                        return Err(SheetsError::Network(format!(
                            "{} after {} attempts",
                            e,
                            MAX_RETRIES + 1
                        )));
                    }
                    log::warn!("{what}: retry {}/{} in {:?} ({})", attempt + 1, MAX_RETRIES, backoff, e);
                    backoff
                }
            };

            thread::sleep(wait);
            backoff *= 2;
            attempt += 1;
        }
    }

    /// Titles of all sheets, in tab order.
    pub fn sheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        let mut url = self.url(None);
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
        let body = self.request_with_retry("GET spreadsheet", |http| http.get(url.clone()))?;

        let sheets = body["sheets"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        sheets
            .iter()
            .map(|s| {
                s["properties"]["title"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| SheetsError::Parse("sheet without properties.title".into()))
            })
            .collect()
    }

    /// Values of a range as display strings. Numbers and booleans that the
    /// API returns unformatted are rendered as text.
    pub fn get_values(&self, range: &A1Range) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.url(Some((range, "")));
        let body = self.request_with_retry(&format!("GET values {range}"), |http| http.get(url.clone()))?;

        let Some(rows) = body["values"].as_array() else {
            return Ok(Vec::new());
        };
        rows.iter()
            .map(|row| {
                let cells = row
                    .as_array()
                    .ok_or_else(|| SheetsError::Parse(format!("values row in {range} is not an array")))?;
                Ok(cells
                    .iter()
                    .map(|c| match c {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect())
            })
            .collect()
    }

    pub fn clear_values(&self, range: &A1Range) -> Result<(), SheetsError> {
        let url = self.url(Some((range, ":clear")));
        self.request_with_retry(&format!("POST values {range}:clear"), |http| {
            http.post(url.clone()).json(&serde_json::json!({}))
        })?;
        Ok(())
    }

    /// Write `values` with RAW input (stored literally, never parsed).
    pub fn update_values(&self, range: &A1Range, values: &[Vec<CellValue>]) -> Result<(), SheetsError> {
        let mut url = self.url(Some((range, "")));
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = ValueRange { range: range.to_string(), major_dimension: "ROWS", values };
        self.request_with_retry(&format!("PUT values {range}"), |http| http.put(url.clone()).json(&body))?;
        Ok(())
    }
}

impl SheetStore for SheetsClient {
    type Error = SheetsError;

    fn sheet_names(&mut self) -> Result<Vec<String>, SheetsError> {
        self.sheet_titles()
    }

    fn read_range(&mut self, range: &A1Range) -> Result<Vec<Vec<String>>, SheetsError> {
        self.get_values(range)
    }

    fn clear_range(&mut self, range: &A1Range) -> Result<(), SheetsError> {
        self.clear_values(range)
    }

    fn write_range(&mut self, range: &A1Range, values: &[Vec<CellValue>]) -> Result<(), SheetsError> {
        self.update_values(range, values)
    }
}
