//! Integration tests for the sync protocol's wire contract.
//!
//! These exercise the exact JSON a device submits and receives. Tests
//! that need a running PostgreSQL database live behind the handlers and
//! require DATABASE_URL; everything here runs standalone.

use binder_engine::{
    AddCardResponse, CardDto, CollectionPage, ServerCard, SyncConflict, SyncReport, SyncRequest,
};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn server_card(card_id: &str, quantity: u32) -> ServerCard {
    ServerCard {
        id: Uuid::new_v4(),
        owner_id: "owner-1".into(),
        card_id: card_id.into(),
        name: "Pikachu".into(),
        set_id: "base1".into(),
        set_name: "Base".into(),
        number: "25".into(),
        rarity: Some("Common".into()),
        image_small: "https://img.example/s/25.png".into(),
        image_large: "https://img.example/l/25.png".into(),
        quantity,
        purchase_price: Some(2.0),
        current_price: Some(7.5),
        added_at: t(1_700_000_000),
        updated_at: t(1_700_000_100),
    }
}

#[test]
fn sync_request_parses_device_json() {
    // Exactly what a device puts on the wire: camelCase keys, ISO-8601
    // timestamps.
    let json = r#"{
        "cards": [
            {
                "cardId": "base1-25",
                "name": "Pikachu",
                "setId": "base1",
                "setName": "Base",
                "number": "25",
                "rarity": null,
                "imageSmall": "https://img.example/s/25.png",
                "imageLarge": "https://img.example/l/25.png",
                "quantity": 2,
                "purchasePrice": 2.5,
                "currentPrice": null,
                "addedAt": "2023-11-14T22:13:20Z",
                "updatedAt": "2023-11-14T22:15:00Z"
            }
        ]
    }"#;

    let request: SyncRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.cards.len(), 1);
    let card = &request.cards[0];
    assert_eq!(card.card_id, "base1-25");
    assert_eq!(card.quantity, 2);
    assert_eq!(card.purchase_price, Some(2.5));
    assert_eq!(card.added_at, t(1_700_000_000));
    assert_eq!(card.updated_at, t(1_700_000_100));
}

#[test]
fn sync_report_serializes_counts_and_conflicts() {
    let server_version = server_card("base1-25", 3);
    let client_version = CardDto {
        card_id: "base1-25".into(),
        name: "Pikachu".into(),
        set_id: "base1".into(),
        set_name: "Base".into(),
        number: "25".into(),
        rarity: None,
        image_small: String::new(),
        image_large: String::new(),
        quantity: 1,
        purchase_price: None,
        current_price: None,
        added_at: t(1_700_000_000),
        updated_at: t(1_700_000_050),
    };

    let report = SyncReport {
        inserted: 2,
        updated: 1,
        conflicts: vec![SyncConflict {
            card_id: "base1-25".into(),
            server_version: server_version.clone(),
            client_version,
        }],
    };

    let json = serde_json::to_string(&report).unwrap();

    assert!(json.contains("\"inserted\":2"));
    assert!(json.contains("\"updated\":1"));
    assert!(json.contains("\"serverVersion\""));
    assert!(json.contains("\"clientVersion\""));

    // The conflict round-trips with both versions intact.
    let parsed: SyncReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.conflicts[0].server_version, server_version);
}

#[test]
fn collection_page_shape() {
    let page = CollectionPage {
        data: vec![server_card("base1-25", 1), server_card("base1-4", 2)],
        pagination: binder_engine::Pagination {
            page: 1,
            limit: 50,
            total: 2,
            total_pages: 1,
        },
    };

    let json = serde_json::to_string(&page).unwrap();
    assert!(json.contains("\"pagination\""));
    assert!(json.contains("\"totalPages\":1"));

    let parsed: CollectionPage = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.data.len(), 2);
}

#[test]
fn add_response_shape() {
    let response = AddCardResponse {
        data: server_card("base1-4", 3),
        merged: true,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"merged\":true"));

    let parsed: AddCardResponse = serde_json::from_str(&json).unwrap();
    assert!(parsed.merged);
    assert_eq!(parsed.data.quantity, 3);
}

#[test]
fn server_card_row_round_trip() {
    let card = server_card("base1-25", 4);

    let json = serde_json::to_string(&card).unwrap();
    assert!(json.contains("\"ownerId\":\"owner-1\""));

    let parsed: ServerCard = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, card);
}
