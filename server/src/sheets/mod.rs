//! Google Sheets access.
//!
//! A thin client over the Sheets v4 REST API: one range read plus the four
//! writes the sync layer needs. Each call is a single round trip with no
//! retry; a non-success response becomes a [`SheetsError`].

mod auth;
mod client;
pub mod range;

pub use auth::{CredentialProvider, NoCredential, StaticToken, TokenFile};
pub use client::SheetsClient;
pub use range::SheetRef;

/// Errors from the Sheets API client.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("No Sheets credential available")]
    MissingCredential,

    #[error("Invalid Sheets API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for Sheets calls.
pub type Result<T> = std::result::Result<T, SheetsError>;
