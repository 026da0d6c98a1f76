//! Contains all database functions for the master item catalogue. Trainer
//! stock lives in `database::inventory`; these rows only describe items.

use sqlx::PgPool;

use super::models::{Item, ItemCategory};
use crate::util;

const ITEM_COLUMNS: &str = "item_id, name, category, description, buy_price, sell_price";

pub async fn get_all(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {} FROM items ORDER BY item_id{}",
        ITEM_COLUMNS,
        util::limit_offset(limit, offset)
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(pool: &PgPool, item_id: i32) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {} FROM items WHERE item_id = $1",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {} FROM items WHERE LOWER(name) = LOWER($1)",
        ITEM_COLUMNS
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list_category(
    pool: &PgPool,
    category: ItemCategory,
) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {} FROM items WHERE category = $1 ORDER BY name",
        ITEM_COLUMNS
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    category: ItemCategory,
    description: Option<&str>,
    buy_price: Option<i64>,
    sell_price: Option<i64>,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO items (name, category, description, buy_price, sell_price)
         VALUES ($1, $2, $3, $4, $5) RETURNING item_id",
    )
    .bind(name)
    .bind(category)
    .bind(description)
    .bind(buy_price)
    .bind(sell_price)
    .fetch_one(pool)
    .await
}

pub async fn set_prices(
    pool: &PgPool,
    item_id: i32,
    buy_price: Option<i64>,
    sell_price: Option<i64>,
) -> Result<(), sqlx::Error> {
    let res = sqlx::query("UPDATE items SET buy_price = $2, sell_price = $3 WHERE item_id = $1")
        .bind(item_id)
        .bind(buy_price)
        .bind(sell_price)
        .execute(pool)
        .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn delete(pool: &PgPool, item_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM items WHERE item_id = $1")
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await
}
