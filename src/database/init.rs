//! Shared database pool types and construction.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DbConfig;

/// A type alias for the database connection pool (`Pool<Postgres>`), used
/// throughout the crate as the shared handle to the database.
pub type DbPool = Pool<Postgres>;

/// Builds the connection pool from a loaded [`DbConfig`]. Connectivity is
/// verified lazily; the first query surfaces a bad URL.
pub async fn connect(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
}
