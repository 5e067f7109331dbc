// Integration tests for the `visitrend` binary.
// Run with: cargo test -p visitrend-cli --test cli_tests

use std::path::Path;
use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::json;

const ID: &str = "1AbCdEf";

/// Binary with a clean environment: no real credentials, no user settings.
fn visitrend(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_visitrend"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("VISITREND_SPREADSHEET_ID");
    cmd.env_remove("GOOGLE_SHEETS_ACCESS_TOKEN");
    cmd.env_remove("GOOGLE_APPLICATION_CREDENTIALS");
    cmd.env_remove("RUST_LOG");
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd.env("HOME", config_home);
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "expected exit {}, got {:?}\nstdout: {}\nstderr: {}",
        code,
        output.status.code(),
        stdout(output),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn values_path(range: &str) -> String {
    format!("/v4/spreadsheets/{ID}/values/{range}")
}

/// Mock a spreadsheet whose only tab is Sheet1 with the given A:B values.
fn mock_sheet(server: &MockServer, rows: serde_json::Value) {
    server.mock(|when, then| {
        when.method(GET).path(format!("/v4/spreadsheets/{ID}"));
        then.status(200).json_body(json!({ "sheets": [{ "properties": { "title": "Sheet1" } }] }));
    });
    server.mock(|when, then| {
        when.method(GET).path(values_path("Sheet1!A:B"));
        then.status(200).json_body(json!({ "values": rows }));
    });
    server.mock(|when, then| {
        when.method(GET).path(values_path("Sheet1!1:1"));
        then.status(200).json_body(json!({ "values": [["Date", "Visitors"]] }));
    });
}

fn august_rows() -> serde_json::Value {
    json!([
        ["Date", "Visitors"],
        ["2023-08-01", "5000"], ["2023-08-02", "2000"], ["2023-08-03", "1500"],
        ["2023-08-04", "1003"], ["2023-08-05", "1345"], ["2023-08-06", "8905"],
        ["2023-08-07", "1200"], ["2023-08-08", "1325"]
    ])
}

fn online_args(server: &MockServer) -> Vec<String> {
    vec![
        "--spreadsheet-id".into(),
        ID.into(),
        "--access-token".into(),
        "ya29.test".into(),
        "--api-base".into(),
        server.base_url(),
    ]
}

// ── Configuration errors ───────────────────────────────────────────

#[test]
fn missing_spreadsheet_id_reports_error_and_exits_0() {
    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path()).output().expect("failed to run visitrend");

    assert_exit(&output, 0);
    let out = stdout(&output);
    assert!(out.starts_with("Starting to calculate moving averages...\n"), "stdout: {out}");
    assert!(out.contains("Error: no spreadsheet id configured"), "stdout: {out}");
}

#[test]
fn missing_spreadsheet_id_strict_exits_21() {
    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path()).arg("--strict-exit").output().expect("failed to run visitrend");
    assert_exit(&output, 21);
}

#[test]
fn missing_token_is_not_authenticated() {
    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(["--spreadsheet-id", ID, "--strict-exit"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 21);
    assert!(stdout(&output).contains("Error: Not authenticated:"), "stdout: {}", stdout(&output));
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(["--config", "/nonexistent/visitrend.toml"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    assert!(stdout(&output).contains("Error: settings file not found"), "stdout: {}", stdout(&output));
}

#[test]
fn bad_window_argument_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(["--window-size", "seven"])
        .output()
        .expect("failed to run visitrend");
    assert_exit(&output, 2);
}

// ── Job outcomes over HTTP ─────────────────────────────────────────

#[test]
fn computes_and_writes_back() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());
    let header = server.mock(|when, then| {
        when.method(PUT)
            .path(values_path("Sheet1!C1"))
            .query_param("valueInputOption", "RAW")
            .header("Authorization", "Bearer ya29.test");
        then.status(200).json_body(json!({}));
    });
    let clear = server.mock(|when, then| {
        when.method(POST).path(values_path("Sheet1!C2:C9:clear"));
        then.status(200).json_body(json!({}));
    });
    let update = server.mock(|when, then| {
        when.method(PUT).path(values_path("Sheet1!C5:C9")).json_body(json!({
            "range": "Sheet1!C5:C9",
            "majorDimension": "ROWS",
            "values": [[2375.75], [1462.0], [3188.25], [3113.25], [3193.75]]
        }));
        then.status(200).json_body(json!({ "updatedCells": 5 }));
    });

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .args(["--window-size", "4"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    header.assert();
    clear.assert();
    update.assert();
    assert_eq!(
        stdout(&output),
        "Starting to calculate moving averages...\nMoving averages calculated and updated successfully.\n"
    );
}

#[test]
fn quiet_success_prints_nothing() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());
    server.mock(|when, then| {
        when.method(PUT).path_includes("/values/");
        then.status(200).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(POST).path_includes(":clear");
        then.status(200).json_body(json!({}));
    });

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .arg("--quiet")
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    assert_eq!(stdout(&output), "");
}

#[test]
fn missing_sheet_reports_message() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .args(["--sheet-name", "dummy-moving-avg-sheet", "--window-size", "3"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    assert!(
        stdout(&output).contains("Error: Sheet with name \"dummy-moving-avg-sheet\" does not exist.\n"),
        "stdout: {}",
        stdout(&output)
    );

    let strict = visitrend(home.path())
        .args(online_args(&server))
        .args(["--sheet-name", "dummy-moving-avg-sheet", "--strict-exit"])
        .output()
        .expect("failed to run visitrend");
    assert_exit(&strict, 10);
}

#[test]
fn invalid_data_reports_message() {
    let server = MockServer::start();
    mock_sheet(
        &server,
        json!([["Date", "Visitors"], ["2023-08-01", "10"], ["2023-08-03", "20"]]),
    );

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .arg("--strict-exit")
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 11);
    assert!(stdout(&output).contains("Error: Invalid Data.\n"), "stdout: {}", stdout(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("job failed [invalid_data]"), "stderr: {stderr}");
}

#[test]
fn oversized_window_reports_message() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());
    let writes = server.mock(|when, then| {
        when.method(PUT).path_includes("/values/");
        then.status(200).json_body(json!({}));
    });

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .args(["--window-size", "10"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    assert!(stdout(&output).contains("Error: Invalid data or window size.\n"), "stdout: {}", stdout(&output));
    writes.assert_calls(0);

    let strict = visitrend(home.path())
        .args(online_args(&server))
        .args(["--window-size", "-1", "--strict-exit"])
        .output()
        .expect("failed to run visitrend");
    assert_exit(&strict, 12);
}

#[test]
fn upstream_failure_is_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/v4/spreadsheets/{ID}"));
        then.status(403).json_body(json!({
            "error": { "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED" }
        }));
    });

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .arg("--strict-exit")
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 20);
    assert!(
        stdout(&output).contains("Error: HTTP 403: The caller does not have permission"),
        "stdout: {}",
        stdout(&output)
    );
}

#[test]
fn dry_run_does_not_write() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());
    let puts = server.mock(|when, then| {
        when.method(PUT).path_includes("/values/");
        then.status(200).json_body(json!({}));
    });
    let clears = server.mock(|when, then| {
        when.method(POST).path_includes(":clear");
        then.status(200).json_body(json!({}));
    });

    let home = tempfile::tempdir().unwrap();
    let output = visitrend(home.path())
        .args(online_args(&server))
        .args(["--window-size", "4", "--dry-run"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    puts.assert_calls(0);
    clears.assert_calls(0);
    let out = stdout(&output);
    assert!(out.contains("Dry run: 5 moving averages (window 4, 8 data rows) would be written to Sheet1!C5:C9."), "stdout: {out}");
    assert!(!out.contains("updated successfully"), "stdout: {out}");
}

// ── Settings file and credentials ──────────────────────────────────

#[test]
fn settings_file_and_credentials_refresh() {
    let server = MockServer::start();
    mock_sheet(&server, august_rows());
    let token = server.mock(|when, then| {
        when.method(POST).path("/token").body_includes("grant_type=refresh_token");
        then.status(200).json_body(json!({ "access_token": "ya29.minted", "expires_in": 3599 }));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path(values_path("Sheet1!C9"))
            .header("Authorization", "Bearer ya29.minted");
        then.status(200).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(PUT).path(values_path("Sheet1!C1"));
        then.status(200).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(POST).path_includes(":clear");
        then.status(200).json_body(json!({}));
    });

    let home = tempfile::tempdir().unwrap();
    let creds = home.path().join("credentials.json");
    std::fs::write(
        &creds,
        json!({
            "type": "authorized_user",
            "client_id": "cid",
            "client_secret": "csec",
            "refresh_token": "1//rt"
        })
        .to_string(),
    )
    .unwrap();
    let settings = home.path().join("settings.toml");
    std::fs::write(
        &settings,
        format!(
            "spreadsheet_id = \"{ID}\"\napi_base = \"{}\"\ntoken_url = \"{}\"\ncredentials_path = \"{}\"\n",
            server.base_url(),
            server.url("/token"),
            creds.display()
        ),
    )
    .unwrap();

    let output = visitrend(home.path())
        .args(["--config", settings.to_str().unwrap(), "--strict-exit"])
        .output()
        .expect("failed to run visitrend");

    assert_exit(&output, 0);
    token.assert();
    update.assert();
    assert!(stdout(&output).contains("updated successfully"), "stdout: {}", stdout(&output));
}
