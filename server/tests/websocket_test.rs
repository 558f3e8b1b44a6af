//! WebSocket message handling.

mod common;

use std::sync::Arc;

use common::*;
use humidor_engine::SyncStatus;
use humidor_server::handlers::process_message;
use humidor_server::websocket::{spawn_status_fanout, ConnectionManager, ServerMessage};
use tokio::sync::mpsc;
use wiremock::MockServer;

#[tokio::test]
async fn ping_gets_pong() {
    let server = MockServer::start().await;
    let service = service(&server);

    let reply = process_message(r#"{"type": "ping"}"#, &service).await;
    assert!(matches!(reply, ServerMessage::Pong));
}

#[tokio::test]
async fn malformed_message_gets_error() {
    let server = MockServer::start().await;
    let service = service(&server);

    let reply = process_message(r#"{"type": "push"}"#, &service).await;
    match reply {
        ServerMessage::Error {
            message,
            request_id,
        } => {
            assert!(message.starts_with("Invalid message format"));
            assert_eq!(request_id, None);
        }
        other => panic!("Expected Error message, got {:?}", other),
    }
}

#[tokio::test]
async fn refresh_reports_counts() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let service = service(&server);

    let reply = process_message(r#"{"type": "refresh", "request_id": "r-1"}"#, &service).await;
    match reply {
        ServerMessage::RefreshResult {
            units,
            skipped,
            request_id,
        } => {
            assert_eq!(units, 4);
            assert_eq!(skipped, 2);
            assert_eq!(request_id.as_deref(), Some("r-1"));
        }
        other => panic!("Expected RefreshResult message, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_refresh_keeps_request_id() {
    let server = MockServer::start().await;
    let service = service(&server);

    let reply = process_message(r#"{"type": "refresh", "request_id": "r-2"}"#, &service).await;
    match reply {
        ServerMessage::Error { request_id, .. } => {
            assert_eq!(request_id.as_deref(), Some("r-2"));
        }
        other => panic!("Expected Error message, got {:?}", other),
    }
}

#[tokio::test]
async fn watchers_see_the_refresh_outcome() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = service(&server);

    let manager = Arc::new(ConnectionManager::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.register(tx);
    spawn_status_fanout(service.status().subscribe(), manager.clone());

    service.refresh().await.unwrap();
    let mut seen = Vec::new();
    while let Some(ServerMessage::Status { status, .. }) = rx.recv().await {
        seen.push(status);
        if status == SyncStatus::Success {
            break;
        }
    }
    assert_eq!(seen.last(), Some(&SyncStatus::Success));
}
