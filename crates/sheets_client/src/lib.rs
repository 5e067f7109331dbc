//! Google Sheets API client.
//!
//! Implements the engine's `SheetStore` over the Sheets v4 REST API:
//! sheet titles, values get / clear / update (RAW input), with retry and
//! backoff for rate limits and server errors. Access tokens come from the
//! caller or from an authorized-user credentials file.

mod auth;
mod client;

pub use auth::{load_credentials, refresh_access_token, resolve_access_token, AuthorizedUserCredentials};
pub use client::{build_http, ClientOptions, SheetsClient, SheetsError, MAX_RETRIES};
