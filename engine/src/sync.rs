//! Sync orchestration.
//!
//! The orchestrator drives one round of the protocol:
//!
//! 1. Read the dirty set from the replica.
//! 2. Empty: pull the full collection and apply it. Done.
//! 3. Otherwise push the dirty set as one batch to the reconciliation
//!    endpoint.
//! 4. Apply returned conflicts (server version overwrites the local
//!    record and clears dirty in one step), then mark the remaining batch
//!    entries synced.
//! 5. Unconditionally pull the full collection, absorbing records created
//!    by other devices or server-side jobs.
//!
//! A transport failure during the push aborts the attempt with the
//! replica untouched; every dirty flag survives for the next call. The
//! server may still have committed part of the batch before the response
//! was lost, which is safe because re-submitting a committed entry is a
//! no-op on the server side.

use crate::dto::{AddCardResponse, CardDto, CollectionPage, SyncReport};
use crate::record::CardRecord;
use crate::replica::ReplicaStore;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Page size used by the trailing pull.
const PULL_PAGE_LIMIT: u32 = 50;

/// Transport seam between the orchestrator and the reconciliation
/// endpoint. Implemented over HTTP in `binder-client`; tests supply an
/// in-memory implementation.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Submit a batch of dirty records for reconciliation.
    async fn push_batch(&self, cards: &[CardDto]) -> Result<SyncReport>;

    /// Fetch one page of the caller's collection.
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<CollectionPage>;

    /// Add a card through the quantity-additive insert path.
    async fn add_card(&self, card: &CardDto) -> Result<AddCardResponse>;

    /// Delete one row outright.
    async fn delete_card(&self, card_id: &str) -> Result<()>;
}

/// What a call to [`SyncOrchestrator::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync was in flight; this call was a no-op.
    AlreadyInFlight,
    /// No dirty records; the replica was refreshed from the server.
    Pulled { fetched: usize },
    /// The dirty set was pushed, outcomes applied, and the replica
    /// refreshed.
    Pushed {
        inserted: u32,
        updated: u32,
        conflicts: usize,
        fetched: usize,
    },
}

/// Client-side driver of the sync protocol.
///
/// Owns the replica behind a mutex (single-writer access) and guards
/// against concurrent invocation with an atomic flag: a `sync` call that
/// finds another in flight returns [`SyncOutcome::AlreadyInFlight`]
/// immediately instead of queueing.
pub struct SyncOrchestrator<A> {
    api: A,
    replica: Mutex<ReplicaStore>,
    in_flight: AtomicBool,
}

/// Resets the in-flight flag when a sync attempt ends, on any path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: SyncApi> SyncOrchestrator<A> {
    pub fn new(api: A, replica: ReplicaStore) -> Self {
        Self {
            api,
            replica: Mutex::new(replica),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a sync attempt is currently running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run a closure against the replica under its lock.
    pub fn with_replica<R>(&self, f: impl FnOnce(&mut ReplicaStore) -> R) -> R {
        f(&mut self.lock_replica())
    }

    /// Run one sync round; see the module docs for the exact steps.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SyncOutcome::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let dirty = self.lock_replica().dirty_records();

        if dirty.is_empty() {
            let fetched = self.pull_all().await?;
            return Ok(SyncOutcome::Pulled { fetched });
        }

        let batch: Vec<CardDto> = dirty.iter().map(CardRecord::to_dto).collect();
        let report = self.api.push_batch(&batch).await?;

        {
            let mut replica = self.lock_replica();
            let now = Utc::now();

            // Conflicts first: the server version lands and clears dirty
            // in one step, so every batch entry ends up clean only once
            // its authoritative resolution is in place.
            let mut conflicted: HashSet<&str> = HashSet::new();
            for conflict in &report.conflicts {
                replica.apply_conflict(conflict, now);
                conflicted.insert(conflict.card_id.as_str());
            }
            for entry in &batch {
                if !conflicted.contains(entry.card_id.as_str()) {
                    replica.mark_synced(&entry.card_id, now);
                }
            }
        }

        let fetched = self.pull_all().await?;

        Ok(SyncOutcome::Pushed {
            inserted: report.inserted,
            updated: report.updated,
            conflicts: report.conflicts.len(),
            fetched,
        })
    }

    /// Add a card through the server's quantity-additive path and apply
    /// the resulting row locally.
    pub async fn add_card(&self, card: &CardDto) -> Result<AddCardResponse> {
        let response = self.api.add_card(card).await?;
        self.lock_replica()
            .upsert_from_server(&response.data, Utc::now());
        Ok(response)
    }

    /// Delete a card on the server, then drop it from the replica.
    ///
    /// Deletes bypass the batch protocol and are issued immediately; the
    /// local record is only removed once the server has confirmed, so a
    /// failed call leaves it (and any dirty flag) in place for a retry.
    pub async fn delete_card(&self, card_id: &str) -> Result<()> {
        self.api.delete_card(card_id).await?;
        self.lock_replica().remove(card_id);
        Ok(())
    }

    /// Fetch every page of the collection and apply it to the replica.
    ///
    /// No lock is held across a page fetch; pulls interleave safely with
    /// other local writers.
    async fn pull_all(&self) -> Result<usize> {
        let mut page = 1u32;
        let mut fetched = 0usize;

        loop {
            let batch = self.api.fetch_page(page, PULL_PAGE_LIMIT).await?;
            let now = Utc::now();
            {
                let mut replica = self.lock_replica();
                for card in &batch.data {
                    replica.upsert_from_server(card, now);
                }
            }
            fetched += batch.data.len();

            if batch.data.is_empty() || page >= batch.pagination.total_pages {
                break;
            }
            page += 1;
        }

        Ok(fetched)
    }

    fn lock_replica(&self) -> MutexGuard<'_, ReplicaStore> {
        self.replica.lock().unwrap_or_else(|e| e.into_inner())
    }
}
