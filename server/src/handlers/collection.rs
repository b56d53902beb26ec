//! Collection read/add/update/delete paths.
//!
//! The add path deliberately does not share the batch endpoint's
//! conflict rule: adding an already-owned card increases its quantity,
//! while the batch path resolves by timestamp precedence. UI flows
//! depend on which rule fires, so the two stay separate entry points.

use crate::db;
use crate::error::{AppError, Result};
use crate::handlers::validate_card;
use binder_engine::{AddCardResponse, CardDto, CardPatch, CollectionPage, Pagination, ServerCard};
use sqlx::PgPool;

const DEFAULT_PAGE_LIMIT: u32 = 50;
const MAX_PAGE_LIMIT: u32 = 200;

fn pagination(page: u32, limit: u32, total: u64) -> Pagination {
    let total_pages = (total.div_ceil(limit as u64)) as u32;
    Pagination {
        page,
        limit,
        total,
        total_pages,
    }
}

/// One page of the owner's collection, newest additions first.
pub async fn handle_get_page(
    pool: &PgPool,
    owner_id: &str,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<CollectionPage> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);

    let total = db::count_cards(pool, owner_id).await? as u64;
    let offset = i64::from(page - 1) * i64::from(limit);
    let rows = db::get_page(pool, owner_id, i64::from(limit), offset).await?;

    Ok(CollectionPage {
        data: rows.iter().map(db::StoredCard::to_card).collect(),
        pagination: pagination(page, limit, total),
    })
}

/// Add a card: insert it, or fold the quantity onto the existing row.
pub async fn handle_add(
    pool: &PgPool,
    owner_id: &str,
    card: CardDto,
) -> Result<AddCardResponse> {
    if !validate_card(&card) {
        return Err(AppError::BadRequest("invalid card".to_string()));
    }

    let (row, merged) = db::upsert_additive(pool, owner_id, &card).await?;

    Ok(AddCardResponse {
        data: row.to_card(),
        merged,
    })
}

/// Partial update of one row.
pub async fn handle_update(
    pool: &PgPool,
    owner_id: &str,
    card_id: &str,
    patch: CardPatch,
) -> Result<ServerCard> {
    if patch.quantity == Some(0) {
        return Err(AppError::BadRequest("quantity must be positive".to_string()));
    }

    match db::patch_card(pool, owner_id, card_id, &patch).await? {
        Some(row) => Ok(row.to_card()),
        None => Err(AppError::NotFound(format!("card {card_id}"))),
    }
}

/// Remove one row outright. Deletes are immediate and never queued
/// through the batch protocol.
pub async fn handle_delete(pool: &PgPool, owner_id: &str, card_id: &str) -> Result<()> {
    if db::delete_card(pool, owner_id, card_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("card {card_id}")))
    }
}
