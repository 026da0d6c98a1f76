//! Contains all database functions for the `trainers` table: the player
//! entity that owns monsters, items, and currency.

use serenity::model::id::UserId;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{DailyReward, Trainer};
use crate::constants::{DAILY_BASE_REWARD, DAILY_STREAK_BONUS, DAILY_STREAK_BONUS_CAP};

const TRAINER_COLUMNS: &str =
    "user_id, display_name, balance, daily_streak, last_daily, created_at";

/// Fetches a trainer, creating the row on first contact. Insert-returning
/// with a select fallback: a data-modifying CTE cannot see its own rows, so
/// the two-step form is the one that works for brand-new trainers.
pub async fn get_or_create(pool: &PgPool, user_id: UserId) -> Result<Trainer, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    if let Some(created) = sqlx::query_as::<_, Trainer>(&format!(
        "INSERT INTO trainers (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING RETURNING {}",
        TRAINER_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_optional(pool)
    .await?
    {
        return Ok(created);
    }
    sqlx::query_as::<_, Trainer>(&format!(
        "SELECT {} FROM trainers WHERE user_id = $1",
        TRAINER_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &PgPool, user_id: UserId) -> Result<Option<Trainer>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_as::<_, Trainer>(&format!(
        "SELECT {} FROM trainers WHERE user_id = $1",
        TRAINER_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_optional(pool)
    .await
}

pub async fn set_display_name(
    pool: &PgPool,
    user_id: UserId,
    name: Option<&str>,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query("UPDATE trainers SET display_name = $2 WHERE user_id = $1")
        .bind(user_id_i64)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Adds (or subtracts) coins within an existing transaction. The update is
/// guarded so a balance can never go negative; an insufficient balance
/// surfaces as `RowNotFound`.
pub async fn add_coins(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    delta: i64,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let res = sqlx::query(
        "UPDATE trainers SET balance = balance + $2 WHERE user_id = $1 AND balance + $2 >= 0",
    )
    .bind(user_id_i64)
    .bind(delta)
    .execute(&mut **tx)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

/// Coin payout for a daily claim at the given streak.
pub fn daily_reward_for_streak(streak: i32) -> i64 {
    let bonus_days = i64::from(streak.max(1) - 1).min(DAILY_STREAK_BONUS_CAP);
    DAILY_BASE_REWARD + bonus_days * DAILY_STREAK_BONUS
}

/// Claims the daily reward: at most once per calendar day, with the streak
/// continuing only when yesterday was claimed too.
#[instrument(level = "debug", skip(pool))]
pub async fn claim_daily(pool: &PgPool, user_id: UserId) -> Result<DailyReward, String> {
    let user_id_i64 = user_id.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let row = sqlx::query_as::<_, (i32,)>(
        "UPDATE trainers SET
            daily_streak = CASE
                WHEN last_daily >= date_trunc('day', NOW()) - INTERVAL '1 day' THEN daily_streak + 1
                ELSE 1
            END,
            last_daily = NOW()
         WHERE user_id = $1 AND (last_daily IS NULL OR last_daily < date_trunc('day', NOW()))
         RETURNING daily_streak",
    )
    .bind(user_id_i64)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;

    let Some((streak,)) = row else {
        tx.rollback().await.ok();
        return Err("You already claimed your daily reward today.".to_string());
    };
    let coins = daily_reward_for_streak(streak);
    add_coins(&mut tx, user_id, coins)
        .await
        .map_err(|_| "Failed to pay the daily reward.".to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(DailyReward { coins, streak })
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trainers")
        .fetch_one(pool)
        .await
}
