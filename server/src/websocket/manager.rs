//! WebSocket connection manager.
//!
//! Tracks active WebSocket connections and fans sync status changes out
//! to all of them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use super::ServerMessage;
use crate::sync::StatusSnapshot;

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// Outgoing channel of each connection, keyed by connection ID.
    connections: DashMap<String, MessageSender>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection.
    ///
    /// Returns the connection ID.
    pub fn register(&self, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();
        self.connections.insert(conn_id.clone(), sender);
        tracing::info!(conn_id = %conn_id, "WebSocket connection registered");
        conn_id
    }

    pub fn unregister(&self, conn_id: &str) {
        if self.connections.remove(conn_id).is_some() {
            tracing::info!(conn_id = %conn_id, "WebSocket connection unregistered");
        }
    }

    /// Broadcast a message to all connections.
    ///
    /// Returns the number of connections that received the message.
    pub fn broadcast_all(&self, message: ServerMessage) -> usize {
        let mut sent_count = 0;

        for entry in self.connections.iter() {
            if entry.value().send(message.clone()).is_ok() {
                sent_count += 1;
            }
        }

        tracing::trace!(recipients = sent_count, "Broadcast message to connections");
        sent_count
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: ServerMessage) -> bool {
        match self.connections.get(conn_id) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Forward every status change to all connected clients until the
/// status channel closes.
pub fn spawn_status_fanout(
    mut status: watch::Receiver<StatusSnapshot>,
    conn_manager: Arc<ConnectionManager>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let snapshot = status.borrow_and_update().clone();
            conn_manager.broadcast_all(snapshot.into());
        }
        tracing::debug!("Status channel closed, fan-out stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::StatusChannel;
    use humidor_engine::{SyncActivity, SyncStatus};

    #[test]
    fn test_register_unregister() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn_id = manager.register(tx);
        assert_eq!(manager.connection_count(), 1);

        manager.unregister(&conn_id);
        assert_eq!(manager.connection_count(), 0);
        assert!(!manager.send_to(&conn_id, ServerMessage::Pong));
    }

    #[test]
    fn test_broadcast_all_skips_closed() {
        let manager = ConnectionManager::new();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        manager.register(tx1);
        manager.register(tx2);
        drop(rx2);

        let sent = manager.broadcast_all(ServerMessage::Pong);
        assert_eq!(sent, 1);
        assert!(matches!(rx1.try_recv().unwrap(), ServerMessage::Pong));
    }

    #[tokio::test]
    async fn test_status_fanout() {
        let manager = ConnectionManager::new_shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register(tx);

        let channel = StatusChannel::new(None);
        spawn_status_fanout(channel.subscribe(), manager.clone());

        channel.begin(SyncActivity::Refresh);
        match rx.recv().await.unwrap() {
            ServerMessage::Status { status, .. } => assert_eq!(status, SyncStatus::Syncing),
            other => panic!("Expected Status message, got {:?}", other),
        }
    }
}
