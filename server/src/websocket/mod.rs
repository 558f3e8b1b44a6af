//! WebSocket support for live sync status.
//!
//! Clients connect and receive every sync status transition as it
//! happens, plus replies to their own requests.

mod manager;
mod protocol;

pub use manager::{spawn_status_fanout, ConnectionManager, MessageSender};
pub use protocol::*;
