//! Contains all database functions for player-to-player trades.
//!
//! A trade is two JSONB manifests (monsters, bucket items, coins) plus a
//! status. Opening a trade locks every listed monster; execution re-reads
//! and re-validates everything inside a single transaction and either
//! applies the whole exchange or rolls back.

use serenity::model::id::UserId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{Trade, TradeManifest, TradeStatus};
use super::{inventory, monsters, trainers};
use crate::constants::{MAX_TRADE_COINS, MAX_TRADE_ITEM_STACKS, MAX_TRADE_MONSTERS};

const TRADE_COLUMNS: &str = "trade_id, initiator_id, recipient_id, status, initiator_manifest, \
     recipient_manifest, created_at, resolved_at";

/// Structural checks on one side of an offer. Ownership and balances are
/// verified against the database separately; this only rejects manifests
/// that could never be valid.
pub fn validate_manifest(manifest: &TradeManifest) -> Result<(), String> {
    if manifest.coins < 0 {
        return Err("Offered coins cannot be negative.".to_string());
    }
    if manifest.coins > MAX_TRADE_COINS {
        return Err(format!("Offered coins exceed the cap of {}.", MAX_TRADE_COINS));
    }
    if manifest.monsters.len() > MAX_TRADE_MONSTERS {
        return Err(format!(
            "At most {} monsters per side of a trade.",
            MAX_TRADE_MONSTERS
        ));
    }
    if manifest.items.len() > MAX_TRADE_ITEM_STACKS {
        return Err(format!(
            "At most {} item stacks per side of a trade.",
            MAX_TRADE_ITEM_STACKS
        ));
    }
    for stack in &manifest.items {
        if stack.quantity <= 0 {
            return Err(format!("Invalid quantity for {}.", stack.name));
        }
    }
    for (i, a) in manifest.monsters.iter().enumerate() {
        if manifest.monsters[i + 1..].contains(a) {
            return Err("The same monster is listed twice.".to_string());
        }
    }
    Ok(())
}

/// Opens a trade: validates both manifests, locks every offered monster to
/// this trade, and inserts the pending row.
#[instrument(level = "debug", skip(pool, offer, ask))]
pub async fn open_trade(
    pool: &PgPool,
    initiator: UserId,
    recipient: UserId,
    offer: TradeManifest,
    ask: TradeManifest,
) -> Result<i64, String> {
    if initiator == recipient {
        return Err("You cannot trade with yourself.".to_string());
    }
    if offer.is_empty() && ask.is_empty() {
        return Err("A trade needs something on at least one side.".to_string());
    }
    validate_manifest(&offer)?;
    validate_manifest(&ask)?;

    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    for m in &offer.monsters {
        monsters::lock_for_trade(&mut tx, m.universe, m.monster_id, initiator)
            .await
            .map_err(|_| "An offered monster is not yours or is already in a trade.".to_string())?;
    }
    for m in &ask.monsters {
        monsters::lock_for_trade(&mut tx, m.universe, m.monster_id, recipient)
            .await
            .map_err(|_| {
                "A requested monster is not the recipient's or is already in a trade.".to_string()
            })?;
    }
    let trade_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO trades (initiator_id, recipient_id, initiator_manifest, recipient_manifest)
         VALUES ($1, $2, $3, $4) RETURNING trade_id",
    )
    .bind(initiator.get() as i64)
    .bind(recipient.get() as i64)
    .bind(Json(&offer))
    .bind(Json(&ask))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(trade_id)
}

pub async fn get_trade(pool: &PgPool, trade_id: i64) -> Result<Option<Trade>, sqlx::Error> {
    sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades WHERE trade_id = $1",
        TRADE_COLUMNS
    ))
    .bind(trade_id)
    .fetch_optional(pool)
    .await
}

/// Pending trades where the trainer is on either side.
pub async fn pending_for(pool: &PgPool, user_id: UserId) -> Result<Vec<Trade>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades
         WHERE status = 'Pending' AND (initiator_id = $1 OR recipient_id = $1)
         ORDER BY created_at",
        TRADE_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_all(pool)
    .await
}

async fn close_pending(
    pool: &PgPool,
    trade_id: i64,
    caller: UserId,
    status: TradeStatus,
) -> Result<(), String> {
    let caller_i64 = caller.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(trade_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    let trade = sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades WHERE trade_id = $1 FOR UPDATE",
        TRADE_COLUMNS
    ))
    .bind(trade_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let Some(trade) = trade else {
        tx.rollback().await.ok();
        return Err("No such trade.".to_string());
    };
    if trade.status != TradeStatus::Pending {
        tx.rollback().await.ok();
        return Err("That trade is already closed.".to_string());
    }
    if caller_i64 != trade.initiator_id && caller_i64 != trade.recipient_id {
        tx.rollback().await.ok();
        return Err("You are not part of that trade.".to_string());
    }
    for m in trade
        .initiator_manifest
        .monsters
        .iter()
        .chain(trade.recipient_manifest.monsters.iter())
    {
        monsters::unlock(&mut tx, m.universe, m.monster_id)
            .await
            .map_err(|e| e.to_string())?;
    }
    sqlx::query("UPDATE trades SET status = $2, resolved_at = NOW() WHERE trade_id = $1")
        .bind(trade_id)
        .bind(status)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Withdraws a pending trade and unlocks its monsters.
pub async fn cancel(pool: &PgPool, trade_id: i64, caller: UserId) -> Result<(), String> {
    close_pending(pool, trade_id, caller, TradeStatus::Cancelled).await
}

/// Declines a pending trade; same cleanup as cancelling.
pub async fn decline(pool: &PgPool, trade_id: i64, caller: UserId) -> Result<(), String> {
    close_pending(pool, trade_id, caller, TradeStatus::Declined).await
}

async fn apply_side(
    tx: &mut Transaction<'_, Postgres>,
    giver: UserId,
    receiver: UserId,
    manifest: &TradeManifest,
) -> Result<(), String> {
    if manifest.coins > 0 {
        trainers::add_coins(tx, giver, -manifest.coins)
            .await
            .map_err(|_| "A trainer no longer has the offered coins.".to_string())?;
        trainers::add_coins(tx, receiver, manifest.coins)
            .await
            .map_err(|_| "Failed to deliver coins.".to_string())?;
    }
    for stack in &manifest.items {
        inventory::adjust(tx, giver, stack.category, &stack.name, -stack.quantity).await?;
        inventory::adjust(tx, receiver, stack.category, &stack.name, stack.quantity).await?;
    }
    for m in &manifest.monsters {
        monsters::transfer(tx, m.universe, m.monster_id, giver, receiver)
            .await
            .map_err(|_| "An offered monster is no longer available.".to_string())?;
    }
    Ok(())
}

/// Executes a pending trade. Everything is re-validated and applied inside
/// one transaction; any failure rolls the whole exchange back. Only the
/// recipient may accept.
#[instrument(level = "debug", skip(pool))]
pub async fn execute(pool: &PgPool, trade_id: i64, acceptor: UserId) -> Result<Trade, String> {
    let acceptor_i64 = acceptor.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    // Serialize competing accept/cancel calls on the same trade.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(trade_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    let trade = sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades WHERE trade_id = $1 FOR UPDATE",
        TRADE_COLUMNS
    ))
    .bind(trade_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let Some(trade) = trade else {
        tx.rollback().await.ok();
        return Err("No such trade.".to_string());
    };
    if trade.status != TradeStatus::Pending {
        tx.rollback().await.ok();
        return Err("That trade is already closed.".to_string());
    }
    if trade.recipient_id != acceptor_i64 {
        tx.rollback().await.ok();
        return Err("Only the trade's recipient can accept it.".to_string());
    }

    let initiator = UserId::new(trade.initiator_id as u64);
    let recipient = UserId::new(trade.recipient_id as u64);
    let result = async {
        apply_side(&mut tx, initiator, recipient, &trade.initiator_manifest).await?;
        apply_side(&mut tx, recipient, initiator, &trade.recipient_manifest).await?;
        sqlx::query(
            "UPDATE trades SET status = 'Accepted', resolved_at = NOW() WHERE trade_id = $1",
        )
        .bind(trade_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
        Ok::<(), String>(())
    }
    .await;
    if let Err(reason) = result {
        tx.rollback().await.ok();
        return Err(reason);
    }
    tx.commit().await.map_err(|e| e.to_string())?;

    let executed = Trade {
        status: TradeStatus::Accepted,
        ..trade
    };
    Ok(executed)
}
