//! Contains all database functions for the trainer task system. Tasks are
//! drawn from a master list into per-trainer assignments each day or week;
//! progress is keyed by objective strings the rest of the crate emits
//! (e.g. `CatchMonster`, `WinBattle`, `FactionSubmission`).

use serenity::model::id::UserId;
use sqlx::{PgPool, Postgres, Transaction};

use super::factions;
use super::inventory;
use super::models::{PlayerTask, TaskKind};
use super::trainers;
use crate::constants::{DAILY_TASK_SLOTS, WEEKLY_TASK_SLOTS};

const PLAYER_TASK_COLUMNS: &str = "pt.player_task_id, t.kind, pt.progress, pt.is_completed, \
     t.title, t.description, t.objective_goal, t.reward_coins, t.reward_item, \
     t.reward_item_category, t.reward_item_quantity, t.reward_faction_id, t.reward_standing";

async fn assign_if_needed(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    kind: TaskKind,
    period: &str,
    slots: i64,
) -> Result<(), sqlx::Error> {
    let assigned: i64 = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM player_tasks pt JOIN tasks t ON pt.task_id = t.task_id
         WHERE pt.user_id = $1 AND t.kind = $2
           AND pt.assigned_at >= date_trunc('{}', NOW())",
        period
    ))
    .bind(user_id)
    .bind(kind)
    .fetch_one(&mut **tx)
    .await?;
    if assigned > 0 {
        return Ok(());
    }
    // Draw fresh tasks at random; one INSERT..SELECT keeps it a single trip.
    sqlx::query(
        "INSERT INTO player_tasks (user_id, task_id)
         SELECT $1, task_id FROM tasks WHERE kind = $2 ORDER BY RANDOM() LIMIT $3",
    )
    .bind(user_id)
    .bind(kind)
    .bind(slots)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns the trainer's live tasks for the current day and week, assigning
/// new ones when a period has rolled over.
pub async fn get_or_assign(pool: &PgPool, user_id: UserId) -> Result<Vec<PlayerTask>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let mut tx = pool.begin().await?;
    assign_if_needed(&mut tx, user_id_i64, TaskKind::Daily, "day", DAILY_TASK_SLOTS).await?;
    assign_if_needed(&mut tx, user_id_i64, TaskKind::Weekly, "week", WEEKLY_TASK_SLOTS).await?;
    let tasks = sqlx::query_as::<_, PlayerTask>(&format!(
        "SELECT {} FROM player_tasks pt JOIN tasks t ON pt.task_id = t.task_id
         WHERE pt.user_id = $1 AND pt.claimed_at IS NULL
           AND pt.assigned_at >= date_trunc(
               CASE t.kind WHEN 'Daily' THEN 'day' ELSE 'week' END::text, NOW())
         ORDER BY t.kind, t.title",
        PLAYER_TASK_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(tasks)
}

/// Bumps progress on every live task matching the objective key, marking
/// tasks complete as they hit their goal. Progress never exceeds the goal.
pub async fn update_progress(
    pool: &PgPool,
    user_id: UserId,
    objective_key: &str,
    increment_by: i32,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query(
        "UPDATE player_tasks pt
         SET progress = LEAST(t.objective_goal, pt.progress + $3),
             is_completed = (pt.progress + $3 >= t.objective_goal),
             completed_at = CASE WHEN pt.progress + $3 >= t.objective_goal
                                 THEN NOW() ELSE pt.completed_at END
         FROM tasks t
         WHERE pt.task_id = t.task_id AND pt.user_id = $1
           AND t.objective_key = $2 AND pt.is_completed = FALSE",
    )
    .bind(user_id_i64)
    .bind(objective_key)
    .bind(increment_by)
    .execute(pool)
    .await?;
    Ok(())
}

/// Pays out a completed task: coins, a bucket item, faction standing, or
/// any mix, in one transaction. Claiming twice is refused.
pub async fn claim(
    pool: &PgPool,
    user_id: UserId,
    player_task_id: i64,
) -> Result<PlayerTask, String> {
    let user_id_i64 = user_id.get() as i64;
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let task = sqlx::query_as::<_, PlayerTask>(&format!(
        "SELECT {} FROM player_tasks pt JOIN tasks t ON pt.task_id = t.task_id
         WHERE pt.player_task_id = $1 AND pt.user_id = $2
           AND pt.is_completed = TRUE AND pt.claimed_at IS NULL
         FOR UPDATE OF pt",
        PLAYER_TASK_COLUMNS
    ))
    .bind(player_task_id)
    .bind(user_id_i64)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;

    let Some(task) = task else {
        tx.rollback().await.ok();
        return Err("That task is not ready to claim, or was already claimed.".to_string());
    };

    if let Some(coins) = task.reward_coins.filter(|c| *c > 0) {
        trainers::add_coins(&mut tx, user_id, coins)
            .await
            .map_err(|_| "Failed to pay the coin reward.".to_string())?;
    }
    if let (Some(name), Some(category), Some(quantity)) = (
        task.reward_item.as_deref(),
        task.reward_item_category,
        task.reward_item_quantity,
    ) {
        inventory::adjust(&mut tx, user_id, category, name, i64::from(quantity)).await?;
    }
    if let (Some(faction_id), Some(standing)) = (task.reward_faction_id, task.reward_standing) {
        factions::adjust_standing(&mut tx, user_id, faction_id, standing)
            .await
            .map_err(|e| e.to_string())?;
    }
    sqlx::query("UPDATE player_tasks SET claimed_at = NOW() WHERE player_task_id = $1")
        .bind(player_task_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;
    Ok(task)
}

/// Completed-but-unclaimed tasks, for the reminder badge.
pub async fn unclaimed_count(pool: &PgPool, user_id: UserId) -> Result<i64, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM player_tasks
         WHERE user_id = $1 AND is_completed = TRUE AND claimed_at IS NULL",
    )
    .bind(user_id_i64)
    .fetch_one(pool)
    .await
}
