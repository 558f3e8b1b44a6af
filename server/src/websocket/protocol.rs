//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded, tagged by `type`, and use snake_case
//! for type names and field names.

use chrono::{DateTime, Utc};
use humidor_engine::SyncStatus;
use serde::{Deserialize, Serialize};

use crate::sync::{RefreshSummary, StatusSnapshot};

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Re-read the sheet.
    Refresh {
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sync status changed. Also sent once on connect.
    Status {
        status: SyncStatus,
        generation: u64,
        changed_at: DateTime<Utc>,
    },

    /// Response to a refresh request.
    RefreshResult {
        units: usize,
        skipped: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    pub fn refresh_result(summary: RefreshSummary, request_id: Option<String>) -> Self {
        ServerMessage::RefreshResult {
            units: summary.units,
            skipped: summary.skipped,
            request_id,
        }
    }
}

impl From<StatusSnapshot> for ServerMessage {
    fn from(snapshot: StatusSnapshot) -> Self {
        ServerMessage::Status {
            status: snapshot.status,
            generation: snapshot.generation,
            changed_at: snapshot.changed_at,
        }
    }
}
