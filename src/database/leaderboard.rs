//! Contains all database queries for leaderboards.

use sqlx::PgPool;

use super::models::{LeaderboardEntry, Universe};
use crate::util;

/// Top collectors: distinct species caught, summed across every universe.
pub async fn collection_leaderboard(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let per_universe = Universe::ALL
        .iter()
        .map(|u| {
            format!(
                "SELECT user_id, COUNT(DISTINCT species_id) AS cnt FROM {} GROUP BY user_id",
                u.caught_table()
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ");
    sqlx::query_as::<_, LeaderboardEntry>(&format!(
        "SELECT user_id, SUM(cnt)::BIGINT AS score FROM ({}) caught
         GROUP BY user_id ORDER BY score DESC{}",
        per_universe,
        util::limit_offset(limit, 0)
    ))
    .fetch_all(pool)
    .await
}

/// Top balances.
pub async fn wealth_leaderboard(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(&format!(
        "SELECT user_id, balance AS score FROM trainers ORDER BY balance DESC{}",
        util::limit_offset(limit, 0)
    ))
    .fetch_all(pool)
    .await
}

/// Longest live habit streak per trainer.
pub async fn habit_streak_leaderboard(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(&format!(
        "SELECT user_id, MAX(streak)::BIGINT AS score FROM habits
         WHERE archived = FALSE GROUP BY user_id ORDER BY score DESC{}",
        util::limit_offset(limit, 0)
    ))
    .fetch_all(pool)
    .await
}
