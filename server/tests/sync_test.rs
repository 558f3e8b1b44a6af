//! Sync service behavior against a mocked sheet.

mod common;

use common::*;
use humidor_engine::{
    Cell, HistoryKey, LotInfo, NewLot, RowCodec, SheetDate, SyncStatus, UnitPatch,
};
use humidor_server::sync::{ConsumeLog, SyncError};
use serde_json::json;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

async fn loaded(server: &MockServer) -> humidor_server::sync::SyncService {
    let service = service(server);
    service.refresh().await.unwrap();
    service
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn refresh_splits_lots_and_skips_structural_rows() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let service = service(&server);

    let summary = service.refresh().await.unwrap();
    assert_eq!(summary.units, 4);
    assert_eq!(summary.skipped, 2);
    assert_eq!(service.status().current().status, SyncStatus::Success);

    let inventory = service.inventory().await;
    let ids: Vec<&str> = inventory.units().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["11.1", "11.2", "11.3", "12"]);

    let remaining: Vec<u32> = inventory.units().iter().map(|u| u.remaining).collect();
    assert_eq!(remaining, vec![23, 23, 22, 25]);
    assert_eq!(inventory.get("11.1").unwrap().consumed, 3);
    assert_eq!(inventory.get("11.1").unwrap().lot.location, "Cabinet");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body(&inventory_rows())))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let service = loaded(&server).await;

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(err, SyncError::Sheets(_)));
    assert_eq!(service.inventory().await.len(), 4);
    assert_eq!(service.status().current().status, SyncStatus::Error);
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn consume_rewrites_the_whole_lot_row() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let outcome = service.consume("11.1", 2, None).await.unwrap();
    assert!(outcome.synced);
    assert_eq!(outcome.data.remaining, 21);
    assert_eq!(outcome.data.consumed, 5);

    let puts = requests(&server, "PUT").await;
    assert_eq!(puts.len(), 1);
    assert!(puts[0].url.path().ends_with("!A2:T2"));

    let values = &json_body(&puts[0])["values"][0];
    assert_eq!(values[1], "11");
    assert_eq!(values[5], 3);
    assert_eq!(values[14], 9);
    assert_eq!(values[15], 66);
    assert!(requests(&server, "POST").await.is_empty());
}

#[tokio::test]
async fn consume_with_log_appends_history() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let log = ConsumeLog {
        notes: "after dinner".to_string(),
    };
    let outcome = service.consume("12", 1, Some(log)).await.unwrap();
    assert!(outcome.synced);

    let posts = requests(&server, "POST").await;
    assert_eq!(posts.len(), 1);
    assert!(posts[0].url.path().ends_with(":append"));
    let values = &json_body(&posts[0])["values"][0];
    assert_eq!(values[1], "12");
    assert_eq!(values[2], "Partagas");
    assert_eq!(values[4], 1);
    assert_eq!(values[5], "after dinner");
}

#[tokio::test]
async fn lot_fields_are_written_for_every_sibling() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let patch = UnitPatch {
        notes: Some("gift".to_string()),
        ..UnitPatch::default()
    };
    let outcome = service.update_unit("11.2", &patch).await.unwrap();
    assert!(outcome.synced);

    for id in ["11.1", "11.2", "11.3"] {
        assert_eq!(service.unit(id).await.unwrap().lot.notes, "gift");
    }
    assert_eq!(service.unit("12").await.unwrap().lot.notes, "");

    let values = &json_body(&requests(&server, "PUT").await[0])["values"][0];
    assert_eq!(values[1], "11");
    assert_eq!(values[19], "gift");
}

#[tokio::test]
async fn failed_write_keeps_local_change() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error encountered." }
        })))
        .mount(&server)
        .await;
    let service = loaded(&server).await;

    let outcome = service.consume("11.1", 2, None).await.unwrap();
    assert!(!outcome.synced);
    assert_eq!(service.unit("11.1").await.unwrap().remaining, 21);
    assert_eq!(service.status().current().status, SyncStatus::Error);
}

#[tokio::test]
async fn rejected_mutation_touches_nothing() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;
    let generation = service.status().current().generation;

    let err = service.consume("12", 26, None).await.unwrap_err();
    assert!(matches!(err, SyncError::Engine(_)));
    assert_eq!(service.unit("12").await.unwrap().remaining, 25);
    assert_eq!(service.status().current().generation, generation);
    assert!(requests(&server, "PUT").await.is_empty());
}

#[tokio::test]
async fn vanished_row_is_not_written() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(values_path("Cigars", "A:T")))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body(&inventory_rows())))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let without_12: Vec<Vec<String>> = inventory_rows()
        .into_iter()
        .filter(|r| r.get(1).map(String::as_str) != Some("12"))
        .collect();
    mount_read(&server, "Cigars", "A:T", &without_12).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let patch = UnitPatch {
        location: Some("Travel case".to_string()),
        ..UnitPatch::default()
    };
    let outcome = service.update_unit("12", &patch).await.unwrap();
    assert!(!outcome.synced);
    assert_eq!(outcome.data.lot.location, "Travel case");
    assert!(requests(&server, "PUT").await.is_empty());
    assert_eq!(service.status().current().status, SyncStatus::Error);
}

#[tokio::test]
async fn box_without_identity_is_never_written() {
    let server = MockServer::start().await;
    let rows = vec![
        row(&["Date", "ID", "Received", "Brand", "Name", "Qty", "Capacity"]),
        lot_row("", "1", "0", "25"),
    ];
    mount_read(&server, "Cigars", "A:T", &rows).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let outcome = service.set_received("row2", true).await.unwrap();
    assert!(!outcome.synced);
    assert!(outcome.data.lot.received);
    assert!(requests(&server, "PUT").await.is_empty());
}

#[tokio::test]
async fn set_received_writes_one_cell() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let outcome = service.set_received("11.3", true).await.unwrap();
    assert!(outcome.synced);
    assert!(service.unit("11.1").await.unwrap().lot.received);

    let puts = requests(&server, "PUT").await;
    assert!(puts[0].url.path().ends_with("!C2"));
    assert_eq!(json_body(&puts[0])["values"], json!([["TRUE"]]));
}

#[tokio::test]
async fn new_boxes_go_above_the_summary_row() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_read(
        &server,
        "Cigars",
        "A:A",
        &[
            row(&["Date"]),
            row(&["Feb 2024"]),
            row(&["Feb 2024"]),
            row(&["Subtotal"]),
        ],
    )
    .await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let new_lot = NewLot {
        lot: LotInfo::new("Cohiba", "Siglo VI", 10),
        quantity: 2,
    };
    let outcome = service.add_lot(new_lot).await.unwrap();
    assert!(outcome.synced);
    let ids: Vec<&str> = outcome.data.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["13.1", "13.2"]);
    assert_eq!(service.inventory().await.len(), 6);

    let posts = requests(&server, "POST").await;
    assert_eq!(posts.len(), 2);
    for post in &posts {
        let insert = &json_body(post)["requests"][0]["insertDimension"];
        assert_eq!(insert["range"]["startIndex"], 3);
    }

    let puts = requests(&server, "PUT").await;
    assert_eq!(puts.len(), 2);
    assert!(puts[0].url.path().ends_with("!A4:T4"));
    assert_eq!(json_body(&puts[0])["values"][0][1], "13.1");
    assert_eq!(json_body(&puts[1])["values"][0][1], "13.2");
    assert_eq!(json_body(&puts[1])["values"][0][15], 10);
}

#[tokio::test]
async fn removing_a_single_box_deletes_its_row() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let outcome = service.remove_unit("12").await.unwrap();
    assert!(outcome.synced);
    assert!(service.unit("12").await.is_none());

    let posts = requests(&server, "POST").await;
    assert_eq!(posts.len(), 1);
    let delete = &json_body(&posts[0])["requests"][0]["deleteDimension"];
    assert_eq!(delete["range"]["sheetId"], 0);
    assert_eq!(delete["range"]["startIndex"], 2);
    assert_eq!(delete["range"]["endIndex"], 3);
}

#[tokio::test]
async fn removing_from_a_lot_repacks_the_row() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let outcome = service.remove_unit("11.2").await.unwrap();
    assert!(outcome.synced);
    assert!(requests(&server, "POST").await.is_empty());

    let values = &json_body(&requests(&server, "PUT").await[0])["values"][0];
    assert_eq!(values[1], "11.1, 11.3");
    assert_eq!(values[5], 2);
    assert_eq!(values[14], 5);
    assert_eq!(values[15], 45);

    assert_eq!(service.unit("11.3").await.unwrap().row_key, "11.1, 11.3");
}

#[tokio::test]
async fn repeated_identity_rows_are_not_merged() {
    let server = MockServer::start().await;
    mount_read(
        &server,
        "Cigars",
        "A:T",
        &[
            row(&["Date", "ID"]),
            lot_row("12", "1", "0", "25"),
            lot_row("12", "1", "5", "20"),
            row(&["Subtotal", "", "", "", "", "2"]),
        ],
    )
    .await;
    mount_writes(&server).await;
    let service = loaded(&server).await;
    assert_eq!(service.inventory().await.len(), 2);

    let outcome = service.consume("12", 1, None).await.unwrap();
    assert!(outcome.synced);
    assert_eq!((outcome.data.consumed, outcome.data.remaining), (1, 24));

    let puts = requests(&server, "PUT").await;
    assert_eq!(puts.len(), 1);
    assert!(puts[0].url.path().ends_with("!A2:T2"));
    let values = &json_body(&puts[0])["values"][0];
    assert_eq!(values[1], "12");
    assert_eq!(values[5], 1);
    assert_eq!(values[14], 1);
    assert_eq!(values[15], 24);

    let inventory = service.inventory().await;
    let second = &inventory.units()[1];
    assert_eq!(second.row_occurrence, 1);
    assert_eq!((second.consumed, second.remaining), (5, 20));
}

#[tokio::test]
async fn new_boxes_are_stored_as_a_refresh_reads_them() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    mount_read(
        &server,
        "Cigars",
        "A:A",
        &[row(&["Date"]), row(&["Subtotal"])],
    )
    .await;
    mount_writes(&server).await;
    let service = loaded(&server).await;

    let new_lot: NewLot = serde_json::from_value(json!({
        "brand": " Cohiba ",
        "name": "Siglo VI",
        "capacity": 10,
        "currency": "gbp",
        "unitCost": "850",
        "quantity": 1,
    }))
    .unwrap();
    let outcome = service.add_lot(new_lot).await.unwrap();
    let unit = &outcome.data[0];
    assert_eq!(unit.lot.brand, "Cohiba");
    assert_eq!(unit.lot.currency, "GBP");
    assert_eq!(unit.lot.location, "Home");

    let codec = RowCodec::default();
    let cells: Vec<String> = codec.encode_unit(unit).iter().map(Cell::as_text).collect();
    assert_eq!(codec.decode_row(&cells, 2).unwrap(), vec![unit.clone()]);

    let values = &json_body(&requests(&server, "PUT").await[0])["values"][0];
    assert_eq!(values[7], "GBP");
    assert_eq!(values[8], "£850.00");
    assert_eq!(values[13], "Home");
}

// ============================================================================
// History
// ============================================================================

fn duplicated_key() -> HistoryKey {
    HistoryKey {
        date: SheetDate::day(2024, 3, 2),
        box_ref: "12".to_string(),
        brand: "Partagas".to_string(),
        name: "Serie D No. 4".to_string(),
        quantity: 2,
    }
}

#[tokio::test]
async fn list_history_skips_header() {
    let server = MockServer::start().await;
    mount_read(&server, "History", "A:F", &history_rows()).await;
    let service = service(&server);

    let entries = service.list_history().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].notes, "with coffee");
}

#[tokio::test]
async fn delete_history_removes_first_match() {
    let server = MockServer::start().await;
    mount_read(&server, "History", "A:F", &history_rows()).await;
    mount_writes(&server).await;
    let service = service(&server);

    service.delete_history(&duplicated_key()).await.unwrap();

    let posts = requests(&server, "POST").await;
    assert_eq!(posts.len(), 1);
    let delete = &json_body(&posts[0])["requests"][0]["deleteDimension"];
    assert_eq!(delete["range"]["sheetId"], 1);
    assert_eq!(delete["range"]["startIndex"], 2);
    assert_eq!(service.status().current().status, SyncStatus::Success);
}

#[tokio::test]
async fn delete_history_without_match() {
    let server = MockServer::start().await;
    mount_read(&server, "History", "A:F", &history_rows()).await;
    mount_writes(&server).await;
    let service = service(&server);

    let key = HistoryKey {
        quantity: 5,
        ..duplicated_key()
    };
    let err = service.delete_history(&key).await.unwrap_err();
    assert!(matches!(err, SyncError::HistoryNotFound));
    assert!(requests(&server, "POST").await.is_empty());
    assert_eq!(service.status().current().status, SyncStatus::Error);
}
