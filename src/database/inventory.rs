//! Contains all database functions for trainer inventories.
//!
//! An inventory row carries one JSONB bucket per item category, each a map
//! of item name to quantity. Mutations read the bucket under a row lock,
//! apply the delta in Rust, and write the whole bucket back in the same
//! transaction.

use std::collections::HashMap;

use serenity::model::id::UserId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{Inventory, ItemCategory};
use crate::constants::{STARTER_BALLS, STARTER_BERRIES};

const INVENTORY_COLUMNS: &str = "user_id, berries, balls, eggs, medicine, key_items";

/// Fetches a trainer's inventory, creating an empty one on first contact.
pub async fn get_or_create(pool: &PgPool, user_id: UserId) -> Result<Inventory, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    if let Some(created) = sqlx::query_as::<_, Inventory>(&format!(
        "INSERT INTO inventories (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING RETURNING {}",
        INVENTORY_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_optional(pool)
    .await?
    {
        return Ok(created);
    }
    sqlx::query_as::<_, Inventory>(&format!(
        "SELECT {} FROM inventories WHERE user_id = $1",
        INVENTORY_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_one(pool)
    .await
}

/// Reads a single bucket without locking, for display.
pub async fn get_bucket(
    pool: &PgPool,
    user_id: UserId,
    category: ItemCategory,
) -> Result<HashMap<String, i64>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let bucket = sqlx::query_scalar::<_, Json<HashMap<String, i64>>>(&format!(
        "SELECT {} FROM inventories WHERE user_id = $1",
        category.bucket_column()
    ))
    .bind(user_id_i64)
    .fetch_optional(pool)
    .await?;
    Ok(bucket.map(|b| b.0).unwrap_or_default())
}

/// Applies a quantity delta to one entry of a bucket map. Quantities never
/// go negative and zeroed entries are dropped.
pub fn apply_delta(
    bucket: &mut HashMap<String, i64>,
    name: &str,
    delta: i64,
) -> Result<(), String> {
    let current = bucket.get(name).copied().unwrap_or(0);
    let next = current + delta;
    if next < 0 {
        return Err(format!(
            "Not enough {}: have {}, need {}.",
            name, current, -delta
        ));
    }
    if next == 0 {
        bucket.remove(name);
    } else {
        bucket.insert(name.to_string(), next);
    }
    Ok(())
}

/// Adjusts one item's quantity inside an existing transaction. The bucket
/// row is locked for the duration so concurrent spends cannot interleave.
#[instrument(level = "debug", skip(tx))]
pub async fn adjust(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    category: ItemCategory,
    name: &str,
    delta: i64,
) -> Result<(), String> {
    if delta == 0 {
        return Ok(());
    }
    let user_id_i64 = user_id.get() as i64;
    let column = category.bucket_column();
    sqlx::query("INSERT INTO inventories (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id_i64)
        .execute(&mut **tx)
        .await
        .map_err(|e| e.to_string())?;
    let Json(mut bucket) = sqlx::query_scalar::<_, Json<HashMap<String, i64>>>(&format!(
        "SELECT {} FROM inventories WHERE user_id = $1 FOR UPDATE",
        column
    ))
    .bind(user_id_i64)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| e.to_string())?;
    apply_delta(&mut bucket, name, delta)?;
    sqlx::query(&format!(
        "UPDATE inventories SET {} = $2 WHERE user_id = $1",
        column
    ))
    .bind(user_id_i64)
    .bind(Json(&bucket))
    .execute(&mut **tx)
    .await
    .map_err(|e| e.to_string())?;
    Ok(())
}

/// Grants the new-trainer starter kit. Safe to call once per trainer; the
/// caller gates it on first profile creation.
pub async fn grant_starter_kit(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), String> {
    adjust(tx, user_id, ItemCategory::Ball, "Capture Ball", STARTER_BALLS).await?;
    adjust(tx, user_id, ItemCategory::Berry, "Oran Berry", STARTER_BERRIES).await?;
    Ok(())
}
