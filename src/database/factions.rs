//! Contains all database functions for factions and trainer standing.
//! Standing moves through submissions (written reports handed to a
//! faction) and meeting attendance; both adjust the same per-pair row.

use serenity::model::id::UserId;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{Faction, FactionStanding, FactionSubmission, LeaderboardEntry};
use crate::util;

const FACTION_COLUMNS: &str = "faction_id, name, motto, emblem, founded_at";
const STANDING_COLUMNS: &str =
    "user_id, faction_id, standing, submissions, meetings_attended, last_submission_at";

// -------------------------------------------------------------------------
// Factions
// -------------------------------------------------------------------------

pub async fn get_all(pool: &PgPool) -> Result<Vec<Faction>, sqlx::Error> {
    sqlx::query_as::<_, Faction>(&format!(
        "SELECT {} FROM factions ORDER BY faction_id",
        FACTION_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, faction_id: i32) -> Result<Option<Faction>, sqlx::Error> {
    sqlx::query_as::<_, Faction>(&format!(
        "SELECT {} FROM factions WHERE faction_id = $1",
        FACTION_COLUMNS
    ))
    .bind(faction_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    motto: Option<&str>,
    emblem: Option<&str>,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO factions (name, motto, emblem) VALUES ($1, $2, $3) RETURNING faction_id",
    )
    .bind(name)
    .bind(motto)
    .bind(emblem)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, faction_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM factions WHERE faction_id = $1")
        .bind(faction_id)
        .execute(pool)
        .await?;
    Ok(())
}

// -------------------------------------------------------------------------
// Standing
// -------------------------------------------------------------------------

/// Rank title for a standing score. Thresholds are shared with the bot's
/// profile rendering.
pub fn rank_for_standing(standing: i32) -> &'static str {
    match standing {
        i32::MIN..=-1 => "Outcast",
        0..=49 => "Stranger",
        50..=149 => "Associate",
        150..=399 => "Member",
        400..=999 => "Trusted",
        _ => "Exemplar",
    }
}

pub async fn get_or_create_standing(
    pool: &PgPool,
    user_id: UserId,
    faction_id: i32,
) -> Result<FactionStanding, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    if let Some(created) = sqlx::query_as::<_, FactionStanding>(&format!(
        "INSERT INTO faction_standings (user_id, faction_id) VALUES ($1, $2)
         ON CONFLICT (user_id, faction_id) DO NOTHING RETURNING {}",
        STANDING_COLUMNS
    ))
    .bind(user_id_i64)
    .bind(faction_id)
    .fetch_optional(pool)
    .await?
    {
        return Ok(created);
    }
    sqlx::query_as::<_, FactionStanding>(&format!(
        "SELECT {} FROM faction_standings WHERE user_id = $1 AND faction_id = $2",
        STANDING_COLUMNS
    ))
    .bind(user_id_i64)
    .bind(faction_id)
    .fetch_one(pool)
    .await
}

/// Adjusts standing inside an existing transaction, creating the pair row
/// if needed. Standing may go negative; that is a meaningful state.
pub async fn adjust_standing(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    faction_id: i32,
    delta: i32,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query(
        "INSERT INTO faction_standings (user_id, faction_id, standing) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, faction_id)
         DO UPDATE SET standing = faction_standings.standing + $3",
    )
    .bind(user_id_i64)
    .bind(faction_id)
    .bind(delta)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Records a submission: one audit row plus the standing bump, atomically.
#[instrument(level = "debug", skip(pool, summary))]
pub async fn record_submission(
    pool: &PgPool,
    user_id: UserId,
    faction_id: i32,
    summary: &str,
    standing_delta: i32,
) -> Result<i64, String> {
    let user_id_i64 = user_id.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let submission_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO faction_submissions (user_id, faction_id, summary, standing_delta)
         VALUES ($1, $2, $3, $4) RETURNING submission_id",
    )
    .bind(user_id_i64)
    .bind(faction_id)
    .bind(summary)
    .bind(standing_delta)
    .fetch_one(&mut *tx)
    .await
    .map_err(|_| "That faction does not exist.".to_string())?;
    adjust_standing(&mut tx, user_id, faction_id, standing_delta)
        .await
        .map_err(|e| e.to_string())?;
    sqlx::query(
        "UPDATE faction_standings SET submissions = submissions + 1, last_submission_at = NOW()
         WHERE user_id = $1 AND faction_id = $2",
    )
    .bind(user_id_i64)
    .bind(faction_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(submission_id)
}

/// Records meeting attendance: bumps the counter and applies the standing
/// reward in one statement.
pub async fn record_meeting(
    pool: &PgPool,
    user_id: UserId,
    faction_id: i32,
    standing_delta: i32,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query(
        "INSERT INTO faction_standings (user_id, faction_id, standing, meetings_attended)
         VALUES ($1, $2, $3, 1)
         ON CONFLICT (user_id, faction_id)
         DO UPDATE SET standing = faction_standings.standing + $3,
                       meetings_attended = faction_standings.meetings_attended + 1",
    )
    .bind(user_id_i64)
    .bind(faction_id)
    .bind(standing_delta)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn recent_submissions(
    pool: &PgPool,
    faction_id: i32,
    limit: i64,
) -> Result<Vec<FactionSubmission>, sqlx::Error> {
    sqlx::query_as::<_, FactionSubmission>(&format!(
        "SELECT submission_id, user_id, faction_id, summary, standing_delta, submitted_at
         FROM faction_submissions WHERE faction_id = $1 ORDER BY submitted_at DESC{}",
        util::limit_offset(limit, 0)
    ))
    .bind(faction_id)
    .fetch_all(pool)
    .await
}

/// Highest standings within one faction.
pub async fn top_standings(
    pool: &PgPool,
    faction_id: i32,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(&format!(
        "SELECT user_id, standing::BIGINT AS score FROM faction_standings
         WHERE faction_id = $1 ORDER BY standing DESC{}",
        util::limit_offset(limit, 0)
    ))
    .bind(faction_id)
    .fetch_all(pool)
    .await
}

/// Trainers with a positive standing, per faction.
pub async fn membership_counts(pool: &PgPool) -> Result<Vec<(i32, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, i64)>(
        "SELECT faction_id, COUNT(*) FROM faction_standings
         WHERE standing > 0 GROUP BY faction_id ORDER BY faction_id",
    )
    .fetch_all(pool)
    .await
}
