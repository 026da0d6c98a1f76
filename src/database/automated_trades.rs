//! Contains all database functions for the rotating NPC trade board: the
//! automated counterpart to player trades. Offers expire on a timer and
//! each trainer can redeem a given offer once.

use rand::Rng;
use serenity::model::id::UserId;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{instrument, warn};

use super::models::{AutomatedTradeOffer, LearnedMove, Universe};
use super::trainers;
use crate::constants::TRADE_BOARD_SIZE;

const OFFER_COLUMNS: &str = "offer_id, universe, wants_species_id, wants_min_level, \
     gives_species_id, gives_level, coin_sweetener, created_at, expires_at";

/// What a redeemed offer produced.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub new_monster_id: i64,
    pub species_name: String,
    pub level: i32,
    pub coins: i64,
}

async fn generate_offer(
    tx: &mut Transaction<'_, Postgres>,
    universe: Universe,
) -> Result<(), sqlx::Error> {
    let pair = sqlx::query_as::<_, (i32, i32)>(&format!(
        "SELECT a.species_id, b.species_id
         FROM {t} a JOIN {t} b ON a.species_id <> b.species_id
         ORDER BY RANDOM() LIMIT 1",
        t = universe.species_table()
    ))
    .fetch_optional(&mut **tx)
    .await?;
    let Some((wants, gives)) = pair else {
        // Catalogue too small to pair up; leave the board short.
        warn!(universe = universe.as_str(), "not enough species to generate a trade offer");
        return Ok(());
    };
    let (wants_min_level, gives_level, sweetener) = {
        let mut rng = rand::rng();
        let wants_min_level: i32 = rng.random_range(5..=30);
        let gives_level = wants_min_level + rng.random_range(0..=10);
        let sweetener: i64 = if rng.random_bool(0.3) {
            i64::from(rng.random_range(1..=5)) * 100
        } else {
            0
        };
        (wants_min_level, gives_level, sweetener)
    };
    sqlx::query(
        "INSERT INTO automated_trades
             (universe, wants_species_id, wants_min_level, gives_species_id, gives_level,
              coin_sweetener, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, NOW() + INTERVAL '1 day')",
    )
    .bind(universe)
    .bind(wants)
    .bind(wants_min_level)
    .bind(gives)
    .bind(gives_level)
    .bind(sweetener)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Expires stale offers and tops the board back up to its full size.
#[instrument(level = "debug", skip(pool))]
pub async fn refresh_board(pool: &PgPool, universe: Universe) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM automated_trades WHERE universe = $1 AND expires_at <= NOW()")
        .bind(universe)
        .execute(&mut *tx)
        .await?;
    let live: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM automated_trades WHERE universe = $1",
    )
    .bind(universe)
    .fetch_one(&mut *tx)
    .await?;
    for _ in live..TRADE_BOARD_SIZE {
        generate_offer(&mut tx, universe).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Live offers for one universe, soonest to expire first.
pub async fn current_board(
    pool: &PgPool,
    universe: Universe,
) -> Result<Vec<AutomatedTradeOffer>, sqlx::Error> {
    sqlx::query_as::<_, AutomatedTradeOffer>(&format!(
        "SELECT {} FROM automated_trades
         WHERE universe = $1 AND expires_at > NOW() ORDER BY expires_at",
        OFFER_COLUMNS
    ))
    .bind(universe)
    .fetch_all(pool)
    .await
}

pub async fn get_offer(
    pool: &PgPool,
    offer_id: i64,
) -> Result<Option<AutomatedTradeOffer>, sqlx::Error> {
    sqlx::query_as::<_, AutomatedTradeOffer>(&format!(
        "SELECT {} FROM automated_trades WHERE offer_id = $1",
        OFFER_COLUMNS
    ))
    .bind(offer_id)
    .fetch_optional(pool)
    .await
}

/// Redeems an NPC offer: hands in a matching monster, receives the offered
/// species plus any coin sweetener. One redemption per trainer per offer;
/// the whole exchange is one transaction.
#[instrument(level = "debug", skip(pool))]
pub async fn execute_trade_transaction(
    pool: &PgPool,
    offer_id: i64,
    user_id: UserId,
    monster_id: i64,
) -> Result<Redemption, String> {
    let user_id_i64 = user_id.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    // Serialize this trainer's redemptions, as elsewhere in the economy.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user_id_i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    let offer = sqlx::query_as::<_, AutomatedTradeOffer>(&format!(
        "SELECT {} FROM automated_trades WHERE offer_id = $1 AND expires_at > NOW() FOR UPDATE",
        OFFER_COLUMNS
    ))
    .bind(offer_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let Some(offer) = offer else {
        tx.rollback().await.ok();
        return Err("That offer is gone or has expired.".to_string());
    };
    let already: Option<i32> = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM automated_trade_redemptions WHERE offer_id = $1 AND user_id = $2",
    )
    .bind(offer_id)
    .bind(user_id_i64)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    if already.is_some() {
        tx.rollback().await.ok();
        return Err("You already redeemed that offer.".to_string());
    }

    // The handed-in monster must match the wanted species and level, be
    // owned by the caller, and not be a favorite or mid-trade.
    let handed_in = sqlx::query_as::<_, (i32, i32)>(&format!(
        "SELECT species_id, level FROM {} WHERE monster_id = $1 AND user_id = $2
           AND trade_locked = FALSE AND is_favorite = FALSE FOR UPDATE",
        offer.universe.caught_table()
    ))
    .bind(monster_id)
    .bind(user_id_i64)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let Some((species_id, level)) = handed_in else {
        tx.rollback().await.ok();
        return Err("That monster is unavailable (not yours, a favorite, or mid-trade).".to_string());
    };
    if species_id != offer.wants_species_id {
        tx.rollback().await.ok();
        return Err("That is not the species this collector wants.".to_string());
    }
    if level < offer.wants_min_level {
        tx.rollback().await.ok();
        return Err(format!(
            "The collector wants level {} or higher.",
            offer.wants_min_level
        ));
    }

    let gives_species = sqlx::query_as::<_, (String,)>(&format!(
        "SELECT name FROM {} WHERE species_id = $1",
        offer.universe.species_table()
    ))
    .bind(offer.gives_species_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|_| "The offered species no longer exists.".to_string())?;

    // The collector consumes the handed-in monster outright.
    sqlx::query(&format!(
        "DELETE FROM {} WHERE monster_id = $1",
        offer.universe.caught_table()
    ))
    .bind(monster_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let empty_moves: &[LearnedMove] = &[];
    let new_monster_id = sqlx::query_scalar::<_, i64>(&format!(
        "INSERT INTO {} (user_id, species_id, level, moves) VALUES ($1, $2, $3, $4)
         RETURNING monster_id",
        offer.universe.caught_table()
    ))
    .bind(user_id_i64)
    .bind(offer.gives_species_id)
    .bind(offer.gives_level)
    .bind(sqlx::types::Json(empty_moves))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    if offer.coin_sweetener > 0 {
        trainers::add_coins(&mut tx, user_id, offer.coin_sweetener)
            .await
            .map_err(|_| "Failed to pay the coin sweetener.".to_string())?;
    }
    sqlx::query("INSERT INTO automated_trade_redemptions (offer_id, user_id) VALUES ($1, $2)")
        .bind(offer_id)
        .bind(user_id_i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(Redemption {
        new_monster_id,
        species_name: gives_species.0,
        level: offer.gives_level,
        coins: offer.coin_sweetener,
    })
}
