//! Contains all database functions for adventures: thread-backed role-play
//! sessions with participants, a log stream, and wild encounters.

use serenity::model::id::{ChannelId, GuildId, UserId};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{
    Adventure, AdventureLogEntry, Encounter, EncounterOutcome, EncounterState, Species, Universe,
};
use crate::util;

const ADVENTURE_COLUMNS: &str = "adventure_id, thread_id, guild_id, title, universe, status, \
     started_by, created_at, closed_at";
const ENCOUNTER_COLUMNS: &str = "encounter_id, adventure_id, universe, species_id, level, state, \
     spawned_at, resolved_at, outcome";

/// Opens a new adventure bound to a Discord thread. The creator is seated
/// as its first participant.
#[instrument(level = "debug", skip(pool, title))]
pub async fn create(
    pool: &PgPool,
    thread_id: ChannelId,
    guild_id: GuildId,
    title: &str,
    universe: Universe,
    started_by: UserId,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let adventure_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO adventures (thread_id, guild_id, title, universe, started_by)
         VALUES ($1, $2, $3, $4, $5) RETURNING adventure_id",
    )
    .bind(thread_id.get() as i64)
    .bind(guild_id.get() as i64)
    .bind(title)
    .bind(universe)
    .bind(started_by.get() as i64)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(
        "INSERT INTO adventure_participants (adventure_id, user_id, is_gm) VALUES ($1, $2, TRUE)",
    )
    .bind(adventure_id)
    .bind(started_by.get() as i64)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(adventure_id)
}

pub async fn get(pool: &PgPool, adventure_id: i64) -> Result<Option<Adventure>, sqlx::Error> {
    sqlx::query_as::<_, Adventure>(&format!(
        "SELECT {} FROM adventures WHERE adventure_id = $1",
        ADVENTURE_COLUMNS
    ))
    .bind(adventure_id)
    .fetch_optional(pool)
    .await
}

/// Looks up the adventure behind a thread, open or closed.
pub async fn get_by_thread(
    pool: &PgPool,
    thread_id: ChannelId,
) -> Result<Option<Adventure>, sqlx::Error> {
    sqlx::query_as::<_, Adventure>(&format!(
        "SELECT {} FROM adventures WHERE thread_id = $1 ORDER BY created_at DESC LIMIT 1",
        ADVENTURE_COLUMNS
    ))
    .bind(thread_id.get() as i64)
    .fetch_optional(pool)
    .await
}

pub async fn list_open(pool: &PgPool, guild_id: GuildId) -> Result<Vec<Adventure>, sqlx::Error> {
    sqlx::query_as::<_, Adventure>(&format!(
        "SELECT {} FROM adventures WHERE guild_id = $1 AND status = 'Open' ORDER BY created_at",
        ADVENTURE_COLUMNS
    ))
    .bind(guild_id.get() as i64)
    .fetch_all(pool)
    .await
}

pub async fn set_title(pool: &PgPool, adventure_id: i64, title: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE adventures SET title = $2 WHERE adventure_id = $1")
        .bind(adventure_id)
        .bind(title)
        .execute(pool)
        .await?;
    Ok(())
}

/// Closes an adventure. Unresolved encounters are marked fled so nothing
/// dangles.
pub async fn close(pool: &PgPool, adventure_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE encounters SET resolved_at = NOW(), outcome = 'Fled'
         WHERE adventure_id = $1 AND resolved_at IS NULL",
    )
    .bind(adventure_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE adventures SET status = 'Closed', closed_at = NOW()
         WHERE adventure_id = $1 AND status = 'Open'",
    )
    .bind(adventure_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

// -------------------------------------------------------------------------
// Participants
// -------------------------------------------------------------------------

/// Seats a trainer in an adventure. Idempotent.
pub async fn add_participant(
    pool: &PgPool,
    adventure_id: i64,
    user_id: UserId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO adventure_participants (adventure_id, user_id) VALUES ($1, $2)
         ON CONFLICT (adventure_id, user_id) DO NOTHING",
    )
    .bind(adventure_id)
    .bind(user_id.get() as i64)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_participant(
    pool: &PgPool,
    adventure_id: i64,
    user_id: UserId,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM adventure_participants WHERE adventure_id = $1 AND user_id = $2")
        .bind(adventure_id)
        .bind(user_id.get() as i64)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn participant_count(pool: &PgPool, adventure_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM adventure_participants WHERE adventure_id = $1",
    )
    .bind(adventure_id)
    .fetch_one(pool)
    .await
}

// -------------------------------------------------------------------------
// Logs
// -------------------------------------------------------------------------

pub async fn append_log(
    pool: &PgPool,
    adventure_id: i64,
    author_id: Option<UserId>,
    entry: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO adventure_logs (adventure_id, author_id, entry) VALUES ($1, $2, $3)
         RETURNING log_id",
    )
    .bind(adventure_id)
    .bind(author_id.map(|id| id.get() as i64))
    .bind(entry)
    .fetch_one(pool)
    .await
}

/// Most recent log entries, newest first.
pub async fn recent_logs(
    pool: &PgPool,
    adventure_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<AdventureLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, AdventureLogEntry>(&format!(
        "SELECT log_id, adventure_id, author_id, entry, posted_at
         FROM adventure_logs WHERE adventure_id = $1 ORDER BY log_id DESC{}",
        util::limit_offset(limit, offset)
    ))
    .bind(adventure_id)
    .fetch_all(pool)
    .await
}

// -------------------------------------------------------------------------
// Encounters
// -------------------------------------------------------------------------

/// Starting HP for a wild encounter of the given species and level.
pub fn encounter_hp(species: &Species, level: i32) -> i32 {
    species.base_hp + level.max(1) * 3
}

/// Spawns a wild encounter in an adventure. Only one unresolved encounter
/// may exist per adventure at a time.
#[instrument(level = "debug", skip(pool, species))]
pub async fn spawn_encounter(
    pool: &PgPool,
    adventure_id: i64,
    species: &Species,
    universe: Universe,
    level: i32,
) -> Result<i64, String> {
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let open: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM encounters WHERE adventure_id = $1 AND resolved_at IS NULL",
    )
    .bind(adventure_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    if open > 0 {
        tx.rollback().await.ok();
        return Err("This adventure already has an active encounter.".to_string());
    }
    let max_hp = encounter_hp(species, level);
    let state = EncounterState {
        current_hp: max_hp,
        max_hp,
        status: None,
        flee_attempts: 0,
    };
    let encounter_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO encounters (adventure_id, universe, species_id, level, state)
         VALUES ($1, $2, $3, $4, $5) RETURNING encounter_id",
    )
    .bind(adventure_id)
    .bind(universe)
    .bind(species.species_id)
    .bind(level)
    .bind(Json(&state))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(encounter_id)
}

pub async fn active_encounter(
    pool: &PgPool,
    adventure_id: i64,
) -> Result<Option<Encounter>, sqlx::Error> {
    sqlx::query_as::<_, Encounter>(&format!(
        "SELECT {} FROM encounters WHERE adventure_id = $1 AND resolved_at IS NULL",
        ENCOUNTER_COLUMNS
    ))
    .bind(adventure_id)
    .fetch_optional(pool)
    .await
}

/// Writes back the engine's mutated encounter snapshot.
pub async fn update_encounter_state(
    pool: &PgPool,
    encounter_id: i64,
    state: &EncounterState,
) -> Result<(), sqlx::Error> {
    let res = sqlx::query(
        "UPDATE encounters SET state = $2 WHERE encounter_id = $1 AND resolved_at IS NULL",
    )
    .bind(encounter_id)
    .bind(Json(state))
    .execute(pool)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

/// Stamps an encounter's outcome. A caught outcome is recorded here; the
/// caller adds the monster through `monsters::record_catch` and bumps task
/// progress itself.
pub async fn resolve_encounter(
    tx: &mut Transaction<'_, Postgres>,
    encounter_id: i64,
    outcome: EncounterOutcome,
) -> Result<(), sqlx::Error> {
    let res = sqlx::query(
        "UPDATE encounters SET resolved_at = NOW(), outcome = $2
         WHERE encounter_id = $1 AND resolved_at IS NULL",
    )
    .bind(encounter_id)
    .bind(outcome)
    .execute(&mut **tx)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}
