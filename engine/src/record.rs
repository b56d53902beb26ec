//! The local collection record.

use crate::dto::{CardDto, ServerCard};
use crate::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One owned card in the local replica.
///
/// `dirty` is set by every local mutation and cleared only after a
/// confirmed round trip for this specific record (or when the record is
/// overwritten from a conflict's server version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    /// Stable catalog identifier, e.g. `"base1-4"`
    pub card_id: CardId,
    pub name: String,
    pub set_id: String,
    pub set_name: String,
    /// Collector number within the set
    pub number: String,
    pub rarity: Option<String>,
    pub image_small: String,
    pub image_large: String,
    /// How many copies are owned; always at least 1
    pub quantity: u32,
    /// What the user paid, if recorded
    pub purchase_price: Option<f64>,
    /// Cached market price, refreshed by the server-side price job
    pub current_price: Option<f64>,
    pub added_at: DateTime<Utc>,
    /// Advanced on every mutation; the server compares this for
    /// last-writer-wins resolution
    pub updated_at: DateTime<Utc>,
    /// Row id assigned by the authoritative store, absent until the first
    /// successful sync
    pub server_id: Option<Uuid>,
    /// True while the record carries an unsynced local mutation
    pub dirty: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CardRecord {
    /// Create a record for a card the user just added locally.
    ///
    /// The record starts dirty with no server id; the next sync pushes it.
    pub fn new(
        card_id: impl Into<CardId>,
        name: impl Into<String>,
        set_id: impl Into<String>,
        set_name: impl Into<String>,
        number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            name: name.into(),
            set_id: set_id.into(),
            set_name: set_name.into(),
            number: number.into(),
            rarity: None,
            image_small: String::new(),
            image_large: String::new(),
            quantity: 1,
            purchase_price: None,
            current_price: None,
            added_at: now,
            updated_at: now,
            server_id: None,
            dirty: true,
            last_synced_at: None,
        }
    }

    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.rarity = Some(rarity.into());
        self
    }

    pub fn with_images(mut self, small: impl Into<String>, large: impl Into<String>) -> Self {
        self.image_small = small.into();
        self.image_large = large.into();
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_purchase_price(mut self, price: f64) -> Self {
        self.purchase_price = Some(price);
        self
    }

    /// Build a clean local record from a server row seen during a pull.
    pub fn from_server(card: &ServerCard, now: DateTime<Utc>) -> Self {
        Self {
            card_id: card.card_id.clone(),
            name: card.name.clone(),
            set_id: card.set_id.clone(),
            set_name: card.set_name.clone(),
            number: card.number.clone(),
            rarity: card.rarity.clone(),
            image_small: card.image_small.clone(),
            image_large: card.image_large.clone(),
            quantity: card.quantity,
            purchase_price: card.purchase_price,
            current_price: card.current_price,
            added_at: card.added_at,
            updated_at: card.updated_at,
            server_id: Some(card.id),
            dirty: false,
            last_synced_at: Some(now),
        }
    }

    /// Overwrite the server-sourced fields from an authoritative row.
    ///
    /// The dirty flag is left untouched: a record that picked up a local
    /// mutation since the sync started must stay scheduled for push.
    pub fn apply_server(&mut self, card: &ServerCard) {
        self.quantity = card.quantity;
        self.purchase_price = card.purchase_price;
        self.current_price = card.current_price;
        self.updated_at = card.updated_at;
        self.server_id = Some(card.id);
    }

    /// Clear the dirty flag after a confirmed round trip.
    pub fn mark_synced(&mut self, now: DateTime<Utc>) {
        self.dirty = false;
        self.last_synced_at = Some(now);
    }

    /// Change the owned quantity; a local mutation, so the record goes
    /// dirty and `updated_at` advances.
    pub fn set_quantity(&mut self, quantity: u32, now: DateTime<Utc>) {
        self.quantity = quantity;
        self.touch(now);
    }

    /// Record or change the purchase price; a local mutation.
    pub fn set_purchase_price(&mut self, price: Option<f64>, now: DateTime<Utc>) {
        self.purchase_price = price;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.dirty = true;
    }

    /// The wire view of this record for a push batch.
    pub fn to_dto(&self) -> CardDto {
        CardDto {
            card_id: self.card_id.clone(),
            name: self.name.clone(),
            set_id: self.set_id.clone(),
            set_name: self.set_name.clone(),
            number: self.number.clone(),
            rarity: self.rarity.clone(),
            image_small: self.image_small.clone(),
            image_large: self.image_large.clone(),
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            current_price: self.current_price,
            added_at: self.added_at,
            updated_at: self.updated_at,
        }
    }
}
