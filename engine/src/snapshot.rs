//! Persistable snapshots of the replica.
//!
//! The engine does no file IO itself; the host application serializes a
//! snapshot wherever it keeps local state and feeds it back on startup.

use crate::record::CardRecord;
use crate::{CardId, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot format version. Bumped on incompatible layout changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A serializable image of the whole replica.
///
/// Records are kept in a `BTreeMap` so the JSON output is deterministic,
/// which keeps persisted snapshots diffable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSnapshot {
    pub format_version: u32,
    pub records: BTreeMap<CardId, CardRecord>,
}

impl ReplicaSnapshot {
    /// Create an empty snapshot at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            records: BTreeMap::new(),
        }
    }

    /// Add a record to the snapshot.
    pub fn add_record(&mut self, record: CardRecord) {
        self.records.insert(record.card_id.clone(), record);
    }

    /// Count of records in the snapshot.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

impl Default for ReplicaSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn json_round_trip() {
        let mut snapshot = ReplicaSnapshot::new();
        snapshot.add_record(CardRecord::new(
            "base1-25",
            "Pikachu",
            "base1",
            "Base",
            "25",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ));

        let json = snapshot.to_json().unwrap();
        let parsed = ReplicaSnapshot::from_json(&json).unwrap();

        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.record_count(), 1);
    }

    #[test]
    fn deterministic_ordering() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut a = ReplicaSnapshot::new();
        a.add_record(CardRecord::new("b", "B", "s", "S", "2", now));
        a.add_record(CardRecord::new("a", "A", "s", "S", "1", now));

        let mut b = ReplicaSnapshot::new();
        b.add_record(CardRecord::new("a", "A", "s", "S", "1", now));
        b.add_record(CardRecord::new("b", "B", "s", "S", "2", now));

        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ReplicaSnapshot::from_json("not json"),
            Err(Error::InvalidSnapshot(_))
        ));
    }
}
