//! The batch reconciliation endpoint.
//!
//! Each entry is processed independently; there is no cross-record
//! transaction. Per entry: read the existing row, decide by strict
//! `updated_at` precedence, write conditionally. Both write paths detect
//! a concurrent writer (unique violation on insert, conditional-update
//! miss on overwrite) and fall back to re-reading, so an interleaved
//! sync from another device can never cause a lost update.

use crate::db;
use crate::error::Result;
use crate::handlers::validate_card;
use binder_engine::{CardDto, SyncConflict, SyncReport};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Bound on read-decide-write rounds for one contended entry.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Which side's write stands for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precedence {
    Client,
    Server,
}

/// Strict timestamp comparison; the server wins ties, so an equal-stamp
/// entry comes back as a conflict instead of silently standing still.
fn precedence(server: DateTime<Utc>, client: DateTime<Utc>) -> Precedence {
    if client > server {
        Precedence::Client
    } else {
        Precedence::Server
    }
}

/// Reconcile one batch of client records against the owner's rows.
pub async fn handle_sync(
    pool: &PgPool,
    owner_id: &str,
    cards: Vec<CardDto>,
) -> Result<SyncReport> {
    let mut inserted = 0;
    let mut updated = 0;
    let mut conflicts = Vec::new();

    for card in &cards {
        if !validate_card(card) {
            tracing::warn!(card_id = %card.card_id, "skipping malformed batch entry");
            continue;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_WRITE_ATTEMPTS {
                tracing::warn!(card_id = %card.card_id, "giving up on contended entry");
                break;
            }

            match db::get_card(pool, owner_id, &card.card_id).await? {
                None => match db::insert_card(pool, owner_id, card).await {
                    Ok(_) => {
                        inserted += 1;
                        break;
                    }
                    // Another writer inserted the row first; re-read and
                    // compare against it.
                    Err(e) if db::is_unique_violation(&e) => continue,
                    Err(e) => return Err(e.into()),
                },
                Some(row) => match precedence(row.updated_at, card.updated_at) {
                    Precedence::Client => {
                        match db::update_card_if_unchanged(pool, owner_id, card, row.updated_at)
                            .await?
                        {
                            Some(_) => {
                                updated += 1;
                                break;
                            }
                            // The row moved under us; re-read.
                            None => continue,
                        }
                    }
                    Precedence::Server => {
                        conflicts.push(SyncConflict {
                            card_id: card.card_id.clone(),
                            server_version: row.to_card(),
                            client_version: card.clone(),
                        });
                        break;
                    }
                },
            }
        }
    }

    tracing::debug!(
        inserted,
        updated,
        conflicts = conflicts.len(),
        "reconciled batch for {owner_id}"
    );

    Ok(SyncReport {
        inserted,
        updated,
        conflicts,
    })
}
