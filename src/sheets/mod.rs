//! # Spreadsheet Backend Module
//!
//! The spreadsheet is used as a simple row store. This module defines the
//! operations the bot needs from it and the errors they can produce:
//! - `google`: Google Sheets REST implementation
//! - `credentials`: service-account key loading and access tokens
//! - `memory`: in-process implementation used by the test-suite

pub mod credentials;
pub mod google;
pub mod memory;

use std::future::Future;

pub use credentials::{CredentialsSource, ServiceAccountKey};
pub use google::GoogleSheets;
pub use memory::InMemorySheets;

/// Row-store operations backed by a spreadsheet
///
/// `column` is 0-based (column A is `0`).
pub trait SheetBackend: Send + Sync {
    /// Read one column top to bottom, down to its last populated cell
    ///
    /// Blank cells above that point read as empty strings, so the position
    /// of each value matches its row.
    fn read_column(
        &self,
        sheet: &str,
        column: usize,
    ) -> impl Future<Output = Result<Vec<String>, SheetError>> + Send;

    /// Append one row after the last populated row of a sheet
    fn append_row(
        &self,
        sheet: &str,
        values: &[String],
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    /// Number of rows in a sheet, up to the last populated cell of column A
    fn row_count(&self, sheet: &str) -> impl Future<Output = Result<usize, SheetError>> + Send {
        async move { Ok(self.read_column(sheet, 0).await?.len()) }
    }
}

/// Errors raised at the spreadsheet boundary
#[derive(Debug, Clone)]
pub enum SheetError {
    /// Service-account key could not be read or parsed
    Credentials(String),
    /// Token exchange with the OAuth endpoint failed
    Auth(String),
    /// Transport-level failure talking to the API
    Transport(String),
    /// API answered with a non-success status
    Api { status: u16, message: String },
    /// Named sheet tab does not exist
    SheetNotFound(String),
    /// Response body could not be decoded
    Decode(String),
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::Credentials(msg) => write!(f, "Credentials error: {msg}"),
            SheetError::Auth(msg) => write!(f, "Authentication error: {msg}"),
            SheetError::Transport(msg) => write!(f, "Transport error: {msg}"),
            SheetError::Api { status, message } => write!(f, "API error ({status}): {message}"),
            SheetError::SheetNotFound(name) => write!(f, "Sheet not found: {name}"),
            SheetError::Decode(msg) => write!(f, "Decode error: {msg}"),
        }
    }
}

impl std::error::Error for SheetError {}

impl From<reqwest::Error> for SheetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SheetError::Decode(err.to_string())
        } else {
            SheetError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        SheetError::Decode(err.to_string())
    }
}

/// Quote a sheet name for use in an A1 range (`'My Sheet'!A:A`)
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Convert a 0-based column index to its A1 letters (0 -> A, 26 -> AA)
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// A1 range covering a whole column of a sheet
pub fn column_range(sheet: &str, column: usize) -> String {
    let letters = column_letters(column);
    format!("{}!{letters}:{letters}", quote_sheet_name(sheet))
}
