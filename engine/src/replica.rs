//! The local replica store.
//!
//! Holds one [`CardRecord`] per card id. All operations are local and
//! synchronous; nothing here touches the network. The orchestrator is the
//! only component that clears dirty flags, and only after a confirmed
//! round trip for the record in question.

use crate::dto::{ServerCard, SyncConflict};
use crate::record::CardRecord;
use crate::snapshot::ReplicaSnapshot;
use crate::{CardId, Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// The device-local copy of the user's collection.
#[derive(Debug, Clone, Default)]
pub struct ReplicaStore {
    records: HashMap<CardId, CardRecord>,
}

impl ReplicaStore {
    /// Create an empty replica.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by card id.
    pub fn get(&self, card_id: &str) -> Option<&CardRecord> {
        self.records.get(card_id)
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &CardRecord> {
        self.records.values()
    }

    /// Count of records in the replica.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every record with an unsynced local mutation.
    pub fn dirty_records(&self) -> Vec<CardRecord> {
        self.records.values().filter(|r| r.dirty).cloned().collect()
    }

    /// Insert a locally created record (dirty, no server id).
    ///
    /// If the card is already present the quantities are combined and the
    /// record goes dirty, mirroring the server's merge-on-insert rule so
    /// a duplicate local add never forks a second record.
    pub fn insert_local(&mut self, record: CardRecord) {
        match self.records.get_mut(&record.card_id) {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(record.quantity);
                existing.set_quantity(merged, record.updated_at);
            }
            None => {
                self.records.insert(record.card_id.clone(), record);
            }
        }
    }

    /// Change the owned quantity of a card; returns false if the card is
    /// not in the replica.
    pub fn set_quantity(&mut self, card_id: &str, quantity: u32, now: DateTime<Utc>) -> bool {
        match self.records.get_mut(card_id) {
            Some(record) => {
                record.set_quantity(quantity, now);
                true
            }
            None => false,
        }
    }

    /// Record or change a card's purchase price; returns false if the
    /// card is not in the replica.
    pub fn set_purchase_price(
        &mut self,
        card_id: &str,
        price: Option<f64>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.records.get_mut(card_id) {
            Some(record) => {
                record.set_purchase_price(price, now);
                true
            }
            None => false,
        }
    }

    /// Apply one authoritative row seen during a pull.
    ///
    /// Creates a clean local record, or overwrites an existing record's
    /// server-sourced fields. The dirty flag of an existing record is left
    /// untouched: only a sync outcome that directly targeted the record
    /// may clear it.
    pub fn upsert_from_server(&mut self, card: &ServerCard, now: DateTime<Utc>) {
        match self.records.get_mut(&card.card_id) {
            Some(existing) => existing.apply_server(card),
            None => {
                self.records
                    .insert(card.card_id.clone(), CardRecord::from_server(card, now));
            }
        }
    }

    /// Clear a record's dirty flag after the server confirmed its write.
    pub fn mark_synced(&mut self, card_id: &str, now: DateTime<Utc>) {
        if let Some(record) = self.records.get_mut(card_id) {
            record.mark_synced(now);
        }
    }

    /// Resolve a lost write: overwrite the local record from the server
    /// version and clear the dirty flag in the same step, so there is no
    /// window where the record is clean but still carries the losing data.
    pub fn apply_conflict(&mut self, conflict: &SyncConflict, now: DateTime<Utc>) {
        let server = &conflict.server_version;
        match self.records.get_mut(&conflict.card_id) {
            Some(record) => {
                record.apply_server(server);
                record.mark_synced(now);
            }
            None => {
                self.records.insert(
                    conflict.card_id.clone(),
                    CardRecord::from_server(server, now),
                );
            }
        }
    }

    /// Remove a record after its server-side delete succeeded.
    pub fn remove(&mut self, card_id: &str) -> Option<CardRecord> {
        self.records.remove(card_id)
    }

    /// Export the replica as a persistable snapshot.
    pub fn export_snapshot(&self) -> ReplicaSnapshot {
        let mut snapshot = ReplicaSnapshot::new();
        for record in self.records.values() {
            snapshot.add_record(record.clone());
        }
        snapshot
    }

    /// Replace the replica contents from a snapshot.
    pub fn import_snapshot(&mut self, snapshot: ReplicaSnapshot) -> Result<()> {
        if snapshot.format_version != crate::snapshot::SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }

        self.records.clear();
        for (card_id, record) in snapshot.records {
            self.records.insert(card_id, record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn local(card_id: &str, now: DateTime<Utc>) -> CardRecord {
        CardRecord::new(card_id, "Pikachu", "base1", "Base", "25", now)
    }

    fn server(card_id: &str, quantity: u32, updated: DateTime<Utc>) -> ServerCard {
        ServerCard {
            id: Uuid::new_v4(),
            owner_id: "owner-1".into(),
            card_id: card_id.into(),
            name: "Pikachu".into(),
            set_id: "base1".into(),
            set_name: "Base".into(),
            number: "25".into(),
            rarity: None,
            image_small: String::new(),
            image_large: String::new(),
            quantity,
            purchase_price: None,
            current_price: Some(7.5),
            added_at: t(100),
            updated_at: updated,
        }
    }

    #[test]
    fn dirty_records_filters() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));
        replica.upsert_from_server(&server("base1-4", 1, t(100)), t(100));

        let dirty = replica.dirty_records();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].card_id, "base1-25");
    }

    #[test]
    fn insert_local_merges_duplicate_add() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));
        replica.insert_local(local("base1-25", t(200)).with_quantity(2));

        assert_eq!(replica.len(), 1);
        let record = replica.get("base1-25").unwrap();
        assert_eq!(record.quantity, 3);
        assert!(record.dirty);
        assert_eq!(record.updated_at, t(200));
    }

    #[test]
    fn upsert_from_server_creates_clean_record() {
        let mut replica = ReplicaStore::new();
        replica.upsert_from_server(&server("base1-25", 2, t(500)), t(600));

        let record = replica.get("base1-25").unwrap();
        assert!(!record.dirty);
        assert!(record.server_id.is_some());
        assert_eq!(record.quantity, 2);
    }

    #[test]
    fn upsert_from_server_leaves_dirty_flag_alone() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));

        replica.upsert_from_server(&server("base1-25", 4, t(500)), t(600));

        let record = replica.get("base1-25").unwrap();
        assert!(record.dirty, "pull must not clean a pending local write");
        assert_eq!(record.quantity, 4);
    }

    #[test]
    fn mark_synced_clears_dirty() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));

        replica.mark_synced("base1-25", t(200));

        let record = replica.get("base1-25").unwrap();
        assert!(!record.dirty);
        assert_eq!(record.last_synced_at, Some(t(200)));
    }

    #[test]
    fn apply_conflict_overwrites_and_clears_dirty_together() {
        let mut replica = ReplicaStore::new();
        let mut record = local("base1-25", t(100));
        record.set_purchase_price(Some(5.0), t(150));
        replica.insert_local(record);

        let server_version = server("base1-25", 1, t(900));
        let conflict = SyncConflict {
            card_id: "base1-25".into(),
            server_version: server_version.clone(),
            client_version: replica.get("base1-25").unwrap().to_dto(),
        };

        replica.apply_conflict(&conflict, t(1000));

        let record = replica.get("base1-25").unwrap();
        assert!(!record.dirty);
        assert_eq!(record.current_price, Some(7.5));
        assert_eq!(record.updated_at, t(900));
        assert_eq!(record.server_id, Some(server_version.id));
        assert_eq!(record.last_synced_at, Some(t(1000)));
    }

    #[test]
    fn set_quantity_on_missing_card() {
        let mut replica = ReplicaStore::new();
        assert!(!replica.set_quantity("base1-25", 2, t(100)));

        replica.insert_local(local("base1-25", t(100)));
        assert!(replica.set_quantity("base1-25", 2, t(200)));
        assert_eq!(replica.get("base1-25").unwrap().quantity, 2);
    }

    #[test]
    fn remove_record() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));

        let removed = replica.remove("base1-25");
        assert!(removed.is_some());
        assert!(replica.is_empty());
        assert!(replica.remove("base1-25").is_none());
    }

    #[test]
    fn snapshot_round_trip() {
        let mut replica = ReplicaStore::new();
        replica.insert_local(local("base1-25", t(100)));
        replica.upsert_from_server(&server("base1-4", 2, t(200)), t(300));

        let snapshot = replica.export_snapshot();
        let json = snapshot.to_json().unwrap();

        let mut restored = ReplicaStore::new();
        restored
            .import_snapshot(ReplicaSnapshot::from_json(&json).unwrap())
            .unwrap();

        assert_eq!(restored.len(), 2);
        assert!(restored.get("base1-25").unwrap().dirty);
        assert!(!restored.get("base1-4").unwrap().dirty);
    }
}
