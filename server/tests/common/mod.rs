//! Shared fixtures for the server integration tests.
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use humidor_engine::RowCodec;
use humidor_server::{
    sheets::{SheetRef, SheetsClient, StaticToken},
    sync::{SheetLayout, StatusChannel, SyncService},
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

pub const SPREADSHEET: &str = "sheet-1";
pub const TOKEN: &str = "test-token";

/// Path regex for a values range on `sheet`, tolerating an encoded quote.
pub fn values_path(sheet: &str, range: &str) -> String {
    format!(
        "^/v4/spreadsheets/{}/values/(%27|'){}(%27|')!{}$",
        SPREADSHEET, sheet, range
    )
}

pub fn batch_update_path() -> String {
    format!("/v4/spreadsheets/{}:batchUpdate", SPREADSHEET)
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// A Partagas lot row with the given identity and counters.
pub fn lot_row(identity: &str, quantity: &str, consumed: &str, remaining: &str) -> Vec<String> {
    row(&[
        "Feb 2024",
        identity,
        "FALSE",
        "Partagas",
        "Serie D No. 4",
        quantity,
        "25",
        "USD",
        "$250.00",
        "$10.00",
        "Ageing",
        "",
        "",
        "Cabinet",
        consumed,
        remaining,
    ])
}

/// Header, lot `11` of three boxes, single box `12`, summary row.
pub fn inventory_rows() -> Vec<Vec<String>> {
    vec![
        row(&[
            "Date", "ID", "Received", "Brand", "Name", "Qty", "Capacity", "Currency",
        ]),
        lot_row("11", "3", "7", "68"),
        lot_row("12", "1", "0", "25"),
        row(&["Subtotal", "", "", "", "", "4"]),
    ]
}

pub fn history_rows() -> Vec<Vec<String>> {
    vec![
        row(&["Date", "Box", "Brand", "Name", "Quantity", "Notes"]),
        row(&["1 Mar 2024", "11.1", "Partagas", "Serie D No. 4", "1", ""]),
        row(&["2 Mar 2024", "12", "Partagas", "Serie D No. 4", "2", "with coffee"]),
        row(&["2 Mar 2024", "12", "Partagas", "Serie D No. 4", "2", "again"]),
    ]
}

pub fn values_body(rows: &[Vec<String>]) -> Value {
    json!({ "majorDimension": "ROWS", "values": rows })
}

pub fn client(server: &MockServer) -> SheetsClient {
    SheetsClient::new(
        &server.uri(),
        SPREADSHEET,
        Arc::new(StaticToken::new(TOKEN)),
        Duration::from_secs(5),
    )
    .unwrap()
}

pub fn layout() -> SheetLayout {
    SheetLayout {
        inventory: SheetRef::new("Cigars", 0),
        history: SheetRef::new("History", 1),
        sentinel: "Subtotal".to_string(),
    }
}

pub fn service(server: &MockServer) -> SyncService {
    SyncService::new(
        client(server),
        RowCodec::default(),
        layout(),
        StatusChannel::new(None),
    )
}

pub async fn mount_read(server: &MockServer, sheet: &str, range: &str, rows: &[Vec<String>]) {
    Mock::given(method("GET"))
        .and(path_regex(values_path(sheet, range)))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body(rows)))
        .mount(server)
        .await;
}

pub async fn mount_inventory(server: &MockServer) {
    mount_read(server, "Cigars", "A:T", &inventory_rows()).await;
}

/// Accept any write with an empty success body.
pub async fn mount_writes(server: &MockServer) {
    for verb in ["PUT", "POST"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(server)
            .await;
    }
}

/// Requests received with `verb`, in arrival order.
pub async fn requests(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .collect()
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}
