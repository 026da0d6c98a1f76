//! Contains all database functions for trainer-defined habits: small
//! recurring commitments tracked with streaks and paid out in coins.

use chrono::{DateTime, Datelike, Duration, Utc};
use serenity::model::id::UserId;
use sqlx::PgPool;
use tracing::instrument;

use super::models::{Habit, HabitCadence, HabitCompletion};
use super::{tasks, trainers};
use crate::constants::{HABIT_BASE_REWARD, HABIT_STREAK_BONUS, HABIT_STREAK_BONUS_CAP};

const HABIT_COLUMNS: &str =
    "habit_id, user_id, name, cadence, streak, best_streak, last_completed_at, archived, created_at";

/// Whether `last` already falls inside the period containing `now`.
pub fn completed_in_current_period(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    cadence: HabitCadence,
) -> bool {
    match cadence {
        HabitCadence::Daily => last.date_naive() == now.date_naive(),
        HabitCadence::Weekly => {
            let (a, b) = (last.iso_week(), now.iso_week());
            a.year() == b.year() && a.week() == b.week()
        }
    }
}

/// Streak value after completing in the period containing `now`, given the
/// previous completion time. Continues only from the immediately preceding
/// period; anything older resets to 1.
pub fn streak_after_completion(
    prev_streak: i32,
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cadence: HabitCadence,
) -> i32 {
    let Some(last) = last else {
        return 1;
    };
    let consecutive = match cadence {
        HabitCadence::Daily => last.date_naive() + Duration::days(1) == now.date_naive(),
        HabitCadence::Weekly => {
            let prev_week_start =
                last.date_naive() - Duration::days(i64::from(last.weekday().num_days_from_monday()));
            let this_week_start =
                now.date_naive() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
            prev_week_start + Duration::days(7) == this_week_start
        }
    };
    if consecutive { prev_streak + 1 } else { 1 }
}

/// Coin payout for completing a habit at the given streak.
pub fn habit_reward(streak: i32) -> i64 {
    let bonus_steps = i64::from(streak.clamp(1, HABIT_STREAK_BONUS_CAP) - 1);
    HABIT_BASE_REWARD + bonus_steps * HABIT_STREAK_BONUS
}

pub async fn create(
    pool: &PgPool,
    user_id: UserId,
    name: &str,
    cadence: HabitCadence,
) -> Result<i64, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO habits (user_id, name, cadence) VALUES ($1, $2, $3) RETURNING habit_id",
    )
    .bind(user_id_i64)
    .bind(name)
    .bind(cadence)
    .fetch_one(pool)
    .await
}

pub async fn list_active(pool: &PgPool, user_id: UserId) -> Result<Vec<Habit>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_as::<_, Habit>(&format!(
        "SELECT {} FROM habits WHERE user_id = $1 AND archived = FALSE ORDER BY created_at",
        HABIT_COLUMNS
    ))
    .bind(user_id_i64)
    .fetch_all(pool)
    .await
}

pub async fn archive(pool: &PgPool, user_id: UserId, habit_id: i64) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let res = sqlx::query("UPDATE habits SET archived = TRUE WHERE habit_id = $1 AND user_id = $2")
        .bind(habit_id)
        .bind(user_id_i64)
        .execute(pool)
        .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn delete(pool: &PgPool, user_id: UserId, habit_id: i64) -> Result<(), sqlx::Error> {
    let res = sqlx::query("DELETE FROM habits WHERE habit_id = $1 AND user_id = $2")
        .bind(habit_id)
        .bind(user_id.get() as i64)
        .execute(pool)
        .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

/// Completes a habit for the current period: refuses double completion,
/// applies the streak rule, and pays the coin reward in one transaction.
#[instrument(level = "debug", skip(pool))]
pub async fn complete(
    pool: &PgPool,
    user_id: UserId,
    habit_id: i64,
) -> Result<HabitCompletion, String> {
    let user_id_i64 = user_id.get() as i64;
    let now = Utc::now();
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    let habit = sqlx::query_as::<_, Habit>(&format!(
        "SELECT {} FROM habits WHERE habit_id = $1 AND user_id = $2 AND archived = FALSE FOR UPDATE",
        HABIT_COLUMNS
    ))
    .bind(habit_id)
    .bind(user_id_i64)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;

    let Some(habit) = habit else {
        tx.rollback().await.ok();
        return Err("No such habit.".to_string());
    };
    if let Some(last) = habit.last_completed_at {
        if completed_in_current_period(last, now, habit.cadence) {
            tx.rollback().await.ok();
            return Err("Already completed for this period.".to_string());
        }
    }

    let streak = streak_after_completion(habit.streak, habit.last_completed_at, now, habit.cadence);
    let best_streak = habit.best_streak.max(streak);
    let reward_coins = habit_reward(streak);
    sqlx::query(
        "UPDATE habits SET streak = $2, best_streak = $3, last_completed_at = $4
         WHERE habit_id = $1",
    )
    .bind(habit_id)
    .bind(streak)
    .bind(best_streak)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?;
    trainers::add_coins(&mut tx, user_id, reward_coins)
        .await
        .map_err(|_| "Failed to pay the habit reward.".to_string())?;
    tx.commit().await.map_err(|e| e.to_string())?;

    tasks::update_progress(pool, user_id, "CompleteHabit", 1)
        .await
        .ok();
    Ok(HabitCompletion {
        streak,
        best_streak,
        reward_coins,
    })
}
