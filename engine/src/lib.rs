//! # Binder Engine
//!
//! The client-side sync core for Binder, a collectible-card collection
//! tracker whose local replica stays consistent with a shared server copy.
//!
//! This crate has no knowledge of files, sockets, or databases. It holds
//! the local replica of the user's collection, tracks which records carry
//! unsynced local mutations, and drives the push/pull protocol through a
//! transport trait the caller supplies.
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! The collection is stored as one [`CardRecord`] per card id:
//! - quantity owned, purchase price, cached market price
//! - `updated_at`, advanced on every mutation and used for conflict
//!   resolution on the server
//! - sync bookkeeping: `dirty` (unsynced local mutation), `server_id`
//!   (assigned by the authoritative store), `last_synced_at`
//!
//! ### Replica store
//!
//! The [`ReplicaStore`] owns the local records. Local mutations mark the
//! record dirty; server-sourced writes ([`ReplicaStore::upsert_from_server`],
//! [`ReplicaStore::apply_conflict`]) never set it. A conflict is applied
//! and the dirty flag cleared in a single call, so a losing local write
//! can never end up clean but stale.
//!
//! ### Orchestration
//!
//! [`SyncOrchestrator::sync`] reads the dirty set, pushes it to the
//! reconciliation endpoint through a [`SyncApi`] implementation, applies
//! the returned conflicts, and finishes with an unconditional paginated
//! pull so records created on other devices are absorbed. An atomic
//! in-flight guard turns overlapping calls into no-ops.
//!
//! ## Quick Start
//!
//! ```rust
//! use binder_engine::{CardRecord, ReplicaStore};
//! use chrono::Utc;
//!
//! let mut replica = ReplicaStore::new();
//! let now = Utc::now();
//! replica.insert_local(CardRecord::new(
//!     "base1-4", "Charizard", "base1", "Base", "4", now,
//! ));
//!
//! assert_eq!(replica.dirty_records().len(), 1);
//! ```
//!
//! ## Persistence
//!
//! Use [`ReplicaStore::export_snapshot`] and [`ReplicaStore::import_snapshot`]
//! with [`ReplicaSnapshot`] for persistence. Snapshots are serializable to
//! JSON with deterministic ordering.

pub mod dto;
pub mod error;
pub mod record;
pub mod replica;
pub mod snapshot;
pub mod sync;

// Re-export main types at crate root
pub use dto::{
    AddCardResponse, CardDto, CardPatch, CollectionPage, Pagination, ServerCard, SyncConflict,
    SyncReport, SyncRequest,
};
pub use error::{Error, Result};
pub use record::CardRecord;
pub use replica::ReplicaStore;
pub use snapshot::{ReplicaSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use sync::{SyncApi, SyncOrchestrator, SyncOutcome};

/// Type aliases for clarity
pub type CardId = String;
pub type OwnerId = String;
