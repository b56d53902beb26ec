//! Wire contracts shared by the client and the server.
//!
//! Everything here crosses the HTTP boundary as camelCase JSON with
//! ISO-8601 timestamps, so both sides of the protocol deserialize the
//! same shapes.

use crate::{CardId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The client's view of one record, as submitted in a push batch or an
/// add-card call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub card_id: CardId,
    pub name: String,
    pub set_id: String,
    pub set_name: String,
    pub number: String,
    pub rarity: Option<String>,
    pub image_small: String,
    pub image_large: String,
    pub quantity: u32,
    pub purchase_price: Option<f64>,
    pub current_price: Option<f64>,
    pub added_at: DateTime<Utc>,
    /// The client's conflict-resolution timestamp
    pub updated_at: DateTime<Utc>,
}

/// One authoritative row, as returned by the pull and add paths and
/// inside conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCard {
    /// Row id assigned by the authoritative store
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub card_id: CardId,
    pub name: String,
    pub set_id: String,
    pub set_name: String,
    pub number: String,
    pub rarity: Option<String>,
    pub image_small: String,
    pub image_large: String,
    pub quantity: u32,
    pub purchase_price: Option<f64>,
    pub current_price: Option<f64>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for the batch reconciliation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub cards: Vec<CardDto>,
}

/// Per-batch outcome of a reconciliation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Entries that had no existing row and were inserted
    pub inserted: u32,
    /// Entries that won last-writer-wins and overwrote the row
    pub updated: u32,
    /// Entries rejected because the server's copy was at least as new
    pub conflicts: Vec<SyncConflict>,
}

/// A rejected batch entry with both versions intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    pub card_id: CardId,
    pub server_version: ServerCard,
    pub client_version: CardDto,
}

/// Pagination metadata on the pull path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of the caller's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage {
    pub data: Vec<ServerCard>,
    pub pagination: Pagination,
}

/// Response of the add-card path.
///
/// `merged` is true when the card was already owned and the requested
/// quantity was added onto the existing row instead of inserting a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardResponse {
    pub data: ServerCard,
    pub merged: bool,
}

/// Partial update for one row on the direct update path.
///
/// Absent fields are left unchanged. This path stamps `updated_at`
/// server-side and does not run the batch conflict logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dto() -> CardDto {
        CardDto {
            card_id: "base1-4".into(),
            name: "Charizard".into(),
            set_id: "base1".into(),
            set_name: "Base".into(),
            number: "4".into(),
            rarity: Some("Rare Holo".into()),
            image_small: "https://img.example/s/4.png".into(),
            image_large: "https://img.example/l/4.png".into(),
            quantity: 1,
            purchase_price: Some(300.0),
            current_price: None,
            added_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
        }
    }

    #[test]
    fn card_dto_wire_format() {
        let json = serde_json::to_string(&dto()).unwrap();

        // camelCase keys and ISO-8601 timestamps
        assert!(json.contains("\"cardId\":\"base1-4\""));
        assert!(json.contains("\"purchasePrice\":300.0"));
        assert!(json.contains("\"updatedAt\":\"2023-11-14T22:15:00Z\""));

        let parsed: CardDto = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dto());
    }

    #[test]
    fn sync_report_deserializes_from_wire_json() {
        let json = r#"{"inserted":2,"updated":1,"conflicts":[]}"#;
        let report: SyncReport = serde_json::from_str(json).unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.updated, 1);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn conflict_carries_both_versions() {
        let server = ServerCard {
            id: Uuid::new_v4(),
            owner_id: "owner-1".into(),
            card_id: "base1-4".into(),
            name: "Charizard".into(),
            set_id: "base1".into(),
            set_name: "Base".into(),
            number: "4".into(),
            rarity: None,
            image_small: String::new(),
            image_large: String::new(),
            quantity: 2,
            purchase_price: None,
            current_price: Some(310.0),
            added_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_200, 0).unwrap(),
        };
        let conflict = SyncConflict {
            card_id: "base1-4".into(),
            server_version: server,
            client_version: dto(),
        };

        let json = serde_json::to_string(&conflict).unwrap();
        assert!(json.contains("\"serverVersion\""));
        assert!(json.contains("\"clientVersion\""));

        let parsed: SyncConflict = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, conflict);
    }

    #[test]
    fn card_patch_skips_absent_fields() {
        let patch = CardPatch {
            quantity: Some(3),
            ..CardPatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();

        assert_eq!(json, r#"{"quantity":3}"#);
    }

    #[test]
    fn pagination_round_trip() {
        let page = Pagination {
            page: 2,
            limit: 50,
            total: 120,
            total_pages: 3,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"totalPages\":3"));

        let parsed: Pagination = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, page);
    }
}
