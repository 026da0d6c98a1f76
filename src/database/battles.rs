//! Contains all database functions for persisted battle state: the
//! instance, its participants, and the log stream. Rule resolution
//! (damage, accuracy, turn outcomes) happens in the battle engine; this
//! module only stores what the engine decides.

use serenity::model::id::{ChannelId, MessageId, UserId};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use super::models::{
    BattleInstance, BattleLogEntry, BattleParticipant, BattleState, BattleStatus,
    NewBattleParticipant, StatusEffect,
};
use crate::util;

const BATTLE_COLUMNS: &str = "battle_id, adventure_id, channel_id, message_id, status, round, \
     state, started_at, ended_at, winner_user_id";
const PARTICIPANT_COLUMNS: &str = "participant_id, battle_id, user_id, universe, monster_id, \
     display_name, level, max_hp, current_hp, speed, turn_order, status_effects, is_npc";

/// Orders seats by descending speed; ties keep their seating order.
pub fn assign_turn_order(participants: &[NewBattleParticipant]) -> Vec<i32> {
    let mut order: Vec<usize> = (0..participants.len()).collect();
    order.sort_by_key(|&i| (-i64::from(participants[i].speed), i));
    let mut slots = vec![0i32; participants.len()];
    for (turn, &idx) in order.iter().enumerate() {
        slots[idx] = turn as i32;
    }
    slots
}

/// Opens a battle and seats every participant in one transaction. Returns
/// the new battle id.
#[instrument(level = "debug", skip(pool, participants), fields(count = participants.len()))]
pub async fn create_battle(
    pool: &PgPool,
    channel_id: ChannelId,
    adventure_id: Option<i64>,
    participants: &[NewBattleParticipant],
) -> Result<i64, String> {
    if participants.len() < 2 {
        return Err("A battle needs at least two participants.".to_string());
    }
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let battle_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO battle_instances (channel_id, adventure_id, status, state)
         VALUES ($1, $2, 'Pending', $3) RETURNING battle_id",
    )
    .bind(channel_id.get() as i64)
    .bind(adventure_id)
    .bind(Json(BattleState::default()))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;

    let turn_orders = assign_turn_order(participants);
    for (seat, turn_order) in participants.iter().zip(turn_orders) {
        sqlx::query(
            "INSERT INTO battle_participants
                 (battle_id, user_id, universe, monster_id, display_name, level,
                  max_hp, current_hp, speed, turn_order, is_npc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10)",
        )
        .bind(battle_id)
        .bind(seat.user_id)
        .bind(seat.universe)
        .bind(seat.monster_id)
        .bind(&seat.display_name)
        .bind(seat.level)
        .bind(seat.max_hp)
        .bind(seat.speed)
        .bind(turn_order)
        .bind(seat.is_npc)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    }
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(battle_id)
}

pub async fn get_battle(
    pool: &PgPool,
    battle_id: i64,
) -> Result<Option<BattleInstance>, sqlx::Error> {
    sqlx::query_as::<_, BattleInstance>(&format!(
        "SELECT {} FROM battle_instances WHERE battle_id = $1",
        BATTLE_COLUMNS
    ))
    .bind(battle_id)
    .fetch_optional(pool)
    .await
}

/// Finds the battle rendered under a given Discord message.
pub async fn get_by_message(
    pool: &PgPool,
    message_id: MessageId,
) -> Result<Option<BattleInstance>, sqlx::Error> {
    sqlx::query_as::<_, BattleInstance>(&format!(
        "SELECT {} FROM battle_instances WHERE message_id = $1",
        BATTLE_COLUMNS
    ))
    .bind(message_id.get() as i64)
    .fetch_optional(pool)
    .await
}

/// Binds the Discord message a battle is rendered under, and marks the
/// instance active.
pub async fn attach_message(
    pool: &PgPool,
    battle_id: i64,
    message_id: MessageId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE battle_instances SET message_id = $2, status = 'Active' WHERE battle_id = $1",
    )
    .bind(battle_id)
    .bind(message_id.get() as i64)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_participants(
    pool: &PgPool,
    battle_id: i64,
) -> Result<Vec<BattleParticipant>, sqlx::Error> {
    sqlx::query_as::<_, BattleParticipant>(&format!(
        "SELECT {} FROM battle_participants WHERE battle_id = $1 ORDER BY turn_order",
        PARTICIPANT_COLUMNS
    ))
    .bind(battle_id)
    .fetch_all(pool)
    .await
}

/// The unfinished battle a trainer is seated in, if any.
pub async fn active_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Option<BattleInstance>, sqlx::Error> {
    sqlx::query_as::<_, BattleInstance>(&format!(
        "SELECT {} FROM battle_instances b WHERE b.status IN ('Pending', 'Active')
           AND EXISTS (SELECT 1 FROM battle_participants p
                       WHERE p.battle_id = b.battle_id AND p.user_id = $1)
         ORDER BY b.started_at DESC LIMIT 1",
        "b.battle_id, b.adventure_id, b.channel_id, b.message_id, b.status, b.round, b.state, \
         b.started_at, b.ended_at, b.winner_user_id"
    ))
    .bind(user_id.get() as i64)
    .fetch_optional(pool)
    .await
}

/// Persists one resolved action: the log line plus the target's HP and
/// status effects, atomically. The entry is stamped with the current round.
#[instrument(level = "debug", skip(pool, entry, status_effects))]
pub async fn record_action(
    pool: &PgPool,
    battle_id: i64,
    target_participant_id: i64,
    new_hp: i32,
    status_effects: &[StatusEffect],
    entry: &str,
) -> Result<(), String> {
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let round = sqlx::query_scalar::<_, i32>(
        "SELECT round FROM battle_instances WHERE battle_id = $1 AND status = 'Active' FOR UPDATE",
    )
    .bind(battle_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    let Some(round) = round else {
        tx.rollback().await.ok();
        return Err("That battle is not active.".to_string());
    };
    let res = sqlx::query(
        "UPDATE battle_participants SET current_hp = GREATEST(0, LEAST(max_hp, $3)),
                status_effects = $4
         WHERE participant_id = $2 AND battle_id = $1",
    )
    .bind(battle_id)
    .bind(target_participant_id)
    .bind(new_hp)
    .bind(Json(status_effects))
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    if res.rows_affected() != 1 {
        tx.rollback().await.ok();
        return Err("No such participant in that battle.".to_string());
    }
    sqlx::query("INSERT INTO battle_logs (battle_id, round, entry) VALUES ($1, $2, $3)")
        .bind(battle_id)
        .bind(round)
        .bind(entry)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(())
}

pub async fn advance_round(pool: &PgPool, battle_id: i64) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "UPDATE battle_instances SET round = round + 1
         WHERE battle_id = $1 AND status = 'Active' RETURNING round",
    )
    .bind(battle_id)
    .fetch_one(pool)
    .await
}

/// Writes back the engine's field-state snapshot.
pub async fn set_battle_state(
    pool: &PgPool,
    battle_id: i64,
    state: &BattleState,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE battle_instances SET state = $2 WHERE battle_id = $1")
        .bind(battle_id)
        .bind(Json(state))
        .execute(pool)
        .await?;
    Ok(())
}

/// Finishes a battle with an optional winner. Already-finished battles are
/// left untouched.
#[instrument(level = "debug", skip(pool))]
pub async fn finish_battle(
    pool: &PgPool,
    battle_id: i64,
    status: BattleStatus,
    winner: Option<UserId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE battle_instances SET status = $2, winner_user_id = $3, ended_at = NOW()
         WHERE battle_id = $1 AND status IN ('Pending', 'Active')",
    )
    .bind(battle_id)
    .bind(status)
    .bind(winner.map(|id| id.get() as i64))
    .execute(pool)
    .await?;
    Ok(())
}

/// Battle log entries in order, paginated.
pub async fn battle_log(
    pool: &PgPool,
    battle_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<BattleLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, BattleLogEntry>(&format!(
        "SELECT log_id, battle_id, round, entry, logged_at
         FROM battle_logs WHERE battle_id = $1 ORDER BY log_id{}",
        util::limit_offset(limit, offset)
    ))
    .bind(battle_id)
    .fetch_all(pool)
    .await
}

pub async fn log_count(pool: &PgPool, battle_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM battle_logs WHERE battle_id = $1")
        .bind(battle_id)
        .fetch_one(pool)
        .await
}
