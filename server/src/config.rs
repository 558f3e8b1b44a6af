//! Configuration management for the server.

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use humidor_engine::DEFAULT_SENTINEL;

use crate::sheets::{CredentialProvider, NoCredential, SheetRef, StaticToken, TokenFile};

/// Default Google Sheets API origin.
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Spreadsheet holding the inventory and history tabs
    pub spreadsheet_id: String,
    /// Sheets API origin, overridable for tests
    pub sheets_api_base: String,
    pub inventory_sheet: SheetRef,
    pub history_sheet: SheetRef,
    /// Text marking the summary row new boxes go above
    pub subtotal_sentinel: String,
    /// Location for rows that leave it blank
    pub default_location: String,
    pub credential: CredentialSource,
    /// Bearer token guarding the local API; open when unset
    pub api_token: Option<String>,
    /// How long success/error stays visible before the status returns to idle
    pub status_linger: Duration,
    pub request_timeout: Duration,
}

/// Where the Sheets access token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static(String),
    /// Re-read on every call so an external refresher can rotate it.
    File(PathBuf),
    None,
}

impl CredentialSource {
    pub fn provider(&self) -> Arc<dyn CredentialProvider> {
        match self {
            CredentialSource::Static(token) => Arc::new(StaticToken::new(token.clone())),
            CredentialSource::File(path) => Arc::new(TokenFile::new(path.clone())),
            CredentialSource::None => Arc::new(NoCredential),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");

        let port: u16 = var("PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let spreadsheet_id = lookup("SPREADSHEET_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingSpreadsheetId)?;

        let sheet_id = |key: &'static str, default: &str| -> Result<i64, ConfigError> {
            var(key, default)
                .parse()
                .map_err(|_| ConfigError::InvalidSheetId(key))
        };
        let inventory_sheet = SheetRef::new(
            var("INVENTORY_SHEET", "Cigars"),
            sheet_id("INVENTORY_SHEET_ID", "0")?,
        );
        let history_sheet = SheetRef::new(
            var("HISTORY_SHEET", "History"),
            sheet_id("HISTORY_SHEET_ID", "1")?,
        );

        let credential = match (lookup("SHEETS_ACCESS_TOKEN"), lookup("SHEETS_TOKEN_FILE")) {
            (Some(token), _) if !token.trim().is_empty() => CredentialSource::Static(token),
            (_, Some(path)) if !path.trim().is_empty() => CredentialSource::File(path.into()),
            _ => CredentialSource::None,
        };

        let status_linger = var("STATUS_LINGER_MS", "3000")
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::Invalid("STATUS_LINGER_MS"))?;

        let request_timeout = var("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        Ok(Self {
            host,
            port,
            spreadsheet_id,
            sheets_api_base: var("SHEETS_API_BASE", DEFAULT_SHEETS_API_BASE),
            inventory_sheet,
            history_sheet,
            subtotal_sentinel: var("SUBTOTAL_SENTINEL", DEFAULT_SENTINEL),
            default_location: var("DEFAULT_LOCATION", humidor_engine::codec::DEFAULT_LOCATION),
            credential,
            api_token: lookup("API_TOKEN").filter(|t| !t.trim().is_empty()),
            status_linger,
            request_timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SPREADSHEET_ID environment variable is required")]
    MissingSpreadsheetId,

    #[error("Invalid {0} value")]
    InvalidSheetId(&'static str),

    #[error("Invalid {0} value")]
    Invalid(&'static str),
}
