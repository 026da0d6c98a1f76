//! Contains all database functions for the master ability catalogue.

use sqlx::PgPool;

use super::models::{Ability, Universe};
use crate::util;

const ABILITY_COLUMNS: &str = "ability_id, name, description, effect_key";

pub async fn get_all(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Ability>, sqlx::Error> {
    sqlx::query_as::<_, Ability>(&format!(
        "SELECT {} FROM abilities ORDER BY ability_id{}",
        ABILITY_COLUMNS,
        util::limit_offset(limit, offset)
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(pool: &PgPool, ability_id: i32) -> Result<Option<Ability>, sqlx::Error> {
    sqlx::query_as::<_, Ability>(&format!(
        "SELECT {} FROM abilities WHERE ability_id = $1",
        ABILITY_COLUMNS
    ))
    .bind(ability_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Ability>, sqlx::Error> {
    sqlx::query_as::<_, Ability>(&format!(
        "SELECT {} FROM abilities WHERE LOWER(name) = LOWER($1)",
        ABILITY_COLUMNS
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// The innate ability of a species, if it has one.
pub async fn ability_for_species(
    pool: &PgPool,
    universe: Universe,
    species_id: i32,
) -> Result<Option<Ability>, sqlx::Error> {
    sqlx::query_as::<_, Ability>(&format!(
        "SELECT a.ability_id, a.name, a.description, a.effect_key
         FROM abilities a JOIN {} s ON s.ability_id = a.ability_id
         WHERE s.species_id = $1",
        universe.species_table()
    ))
    .bind(species_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    effect_key: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO abilities (name, description, effect_key) VALUES ($1, $2, $3)
         RETURNING ability_id",
    )
    .bind(name)
    .bind(description)
    .bind(effect_key)
    .fetch_one(pool)
    .await
}

pub async fn update_description(
    pool: &PgPool,
    ability_id: i32,
    description: &str,
) -> Result<(), sqlx::Error> {
    let res = sqlx::query("UPDATE abilities SET description = $2 WHERE ability_id = $1")
        .bind(ability_id)
        .bind(description)
        .execute(pool)
        .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn delete(pool: &PgPool, ability_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM abilities WHERE ability_id = $1")
        .bind(ability_id)
        .execute(pool)
        .await?;
    Ok(())
}
