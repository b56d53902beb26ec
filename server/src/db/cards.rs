//! Database operations for the collection_cards table.

use binder_engine::{CardDto, CardPatch, ServerCard};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A stored collection row from the database.
#[derive(Debug, Clone)]
pub struct StoredCard {
    pub id: Uuid,
    pub owner_id: String,
    pub card_id: String,
    pub name: String,
    pub set_id: String,
    pub set_name: String,
    pub number: String,
    pub rarity: Option<String>,
    pub image_small: String,
    pub image_large: String,
    pub quantity: i32,
    pub purchase_price: Option<f64>,
    pub current_price: Option<f64>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredCard {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredCard {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            card_id: row.try_get("card_id")?,
            name: row.try_get("name")?,
            set_id: row.try_get("set_id")?,
            set_name: row.try_get("set_name")?,
            number: row.try_get("number")?,
            rarity: row.try_get("rarity")?,
            image_small: row.try_get("image_small")?,
            image_large: row.try_get("image_large")?,
            quantity: row.try_get("quantity")?,
            purchase_price: row.try_get("purchase_price")?,
            current_price: row.try_get("current_price")?,
            added_at: row.try_get("added_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredCard {
    /// Convert database row to the wire view.
    pub fn to_card(&self) -> ServerCard {
        ServerCard {
            id: self.id,
            owner_id: self.owner_id.clone(),
            card_id: self.card_id.clone(),
            name: self.name.clone(),
            set_id: self.set_id.clone(),
            set_name: self.set_name.clone(),
            number: self.number.clone(),
            rarity: self.rarity.clone(),
            image_small: self.image_small.clone(),
            image_large: self.image_large.clone(),
            quantity: self.quantity.max(0) as u32,
            purchase_price: self.purchase_price,
            current_price: self.current_price,
            added_at: self.added_at,
            updated_at: self.updated_at,
        }
    }
}

const CARD_COLUMNS: &str = "id, owner_id, card_id, name, set_id, set_name, number, rarity, \
     image_small, image_large, quantity, purchase_price, current_price, added_at, updated_at";

/// Get one row by owner and card id.
pub async fn get_card(
    pool: &PgPool,
    owner_id: &str,
    card_id: &str,
) -> Result<Option<StoredCard>, sqlx::Error> {
    sqlx::query_as::<_, StoredCard>(&format!(
        "SELECT {CARD_COLUMNS} FROM collection_cards WHERE owner_id = $1 AND card_id = $2"
    ))
    .bind(owner_id)
    .bind(card_id)
    .fetch_optional(pool)
    .await
}

/// Count of rows owned by the caller.
pub async fn count_cards(pool: &PgPool, owner_id: &str) -> Result<i64, sqlx::Error> {
    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM collection_cards WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await?;

    Ok(result.0)
}

/// One page of the caller's collection, newest additions first.
pub async fn get_page(
    pool: &PgPool,
    owner_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoredCard>, sqlx::Error> {
    sqlx::query_as::<_, StoredCard>(&format!(
        "SELECT {CARD_COLUMNS} FROM collection_cards \
         WHERE owner_id = $1 \
         ORDER BY added_at DESC, card_id ASC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(owner_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Insert a new row from a batch entry. The submitted fields are kept,
/// except `updated_at`, which is stamped with the server clock.
///
/// Fails with a unique violation when another writer inserted the same
/// (owner, card) first; the caller re-reads and re-decides.
pub async fn insert_card(
    pool: &PgPool,
    owner_id: &str,
    card: &CardDto,
) -> Result<StoredCard, sqlx::Error> {
    sqlx::query_as::<_, StoredCard>(&format!(
        "INSERT INTO collection_cards ( \
             owner_id, card_id, name, set_id, set_name, number, rarity, \
             image_small, image_large, quantity, purchase_price, current_price, \
             added_at, updated_at \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now()) \
         RETURNING {CARD_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(&card.card_id)
    .bind(&card.name)
    .bind(&card.set_id)
    .bind(&card.set_name)
    .bind(&card.number)
    .bind(&card.rarity)
    .bind(&card.image_small)
    .bind(&card.image_large)
    .bind(card.quantity as i32)
    .bind(card.purchase_price)
    .bind(card.current_price)
    .bind(card.added_at)
    .fetch_one(pool)
    .await
}

/// Last-writer-wins overwrite, conditional on the row being unchanged
/// since it was read (`updated_at = $expected`). Returns `None` when the
/// row was modified in between; the caller re-reads and re-decides.
pub async fn update_card_if_unchanged(
    pool: &PgPool,
    owner_id: &str,
    card: &CardDto,
    expected_updated_at: DateTime<Utc>,
) -> Result<Option<StoredCard>, sqlx::Error> {
    sqlx::query_as::<_, StoredCard>(&format!(
        "UPDATE collection_cards SET \
             name = $3, set_id = $4, set_name = $5, number = $6, rarity = $7, \
             image_small = $8, image_large = $9, quantity = $10, \
             purchase_price = $11, current_price = $12, updated_at = now() \
         WHERE owner_id = $1 AND card_id = $2 AND updated_at = $13 \
         RETURNING {CARD_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(&card.card_id)
    .bind(&card.name)
    .bind(&card.set_id)
    .bind(&card.set_name)
    .bind(&card.number)
    .bind(&card.rarity)
    .bind(&card.image_small)
    .bind(&card.image_large)
    .bind(card.quantity as i32)
    .bind(card.purchase_price)
    .bind(card.current_price)
    .bind(expected_updated_at)
    .fetch_optional(pool)
    .await
}

/// Merge-on-insert for the add path: a single atomic statement, so two
/// concurrent adds of a never-seen card land on one row with the summed
/// quantity. Returns the row and whether it merged onto an existing one.
pub async fn upsert_additive(
    pool: &PgPool,
    owner_id: &str,
    card: &CardDto,
) -> Result<(StoredCard, bool), sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO collection_cards ( \
             owner_id, card_id, name, set_id, set_name, number, rarity, \
             image_small, image_large, quantity, purchase_price, current_price \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (owner_id, card_id) DO UPDATE SET \
             quantity = collection_cards.quantity + EXCLUDED.quantity, \
             updated_at = now() \
         RETURNING {CARD_COLUMNS}, (xmax = 0) AS inserted"
    ))
    .bind(owner_id)
    .bind(&card.card_id)
    .bind(&card.name)
    .bind(&card.set_id)
    .bind(&card.set_name)
    .bind(&card.number)
    .bind(&card.rarity)
    .bind(&card.image_small)
    .bind(&card.image_large)
    .bind(card.quantity as i32)
    .bind(card.purchase_price)
    .bind(card.current_price)
    .fetch_one(pool)
    .await?;

    let inserted: bool = row.try_get("inserted")?;
    let card = sqlx::FromRow::from_row(&row)?;

    Ok((card, !inserted))
}

/// Partial update of one row; absent fields are left unchanged and
/// `updated_at` is stamped. Returns `None` when the row does not exist.
pub async fn patch_card(
    pool: &PgPool,
    owner_id: &str,
    card_id: &str,
    patch: &CardPatch,
) -> Result<Option<StoredCard>, sqlx::Error> {
    sqlx::query_as::<_, StoredCard>(&format!(
        "UPDATE collection_cards SET \
             quantity = COALESCE($3, quantity), \
             purchase_price = COALESCE($4, purchase_price), \
             current_price = COALESCE($5, current_price), \
             updated_at = now() \
         WHERE owner_id = $1 AND card_id = $2 \
         RETURNING {CARD_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(card_id)
    .bind(patch.quantity.map(|q| q as i32))
    .bind(patch.purchase_price)
    .bind(patch.current_price)
    .fetch_optional(pool)
    .await
}

/// Remove one row outright. Returns whether a row was deleted.
pub async fn delete_card(
    pool: &PgPool,
    owner_id: &str,
    card_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM collection_cards WHERE owner_id = $1 AND card_id = $2")
        .bind(owner_id)
        .bind(card_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Check if a SQL error is a unique constraint violation.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        // PostgreSQL unique violation code is "23505"
        db_err.code().map(|c| c == "23505").unwrap_or(false)
    } else {
        false
    }
}
