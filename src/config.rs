//! Environment-driven database configuration.
//!
//! The bot binary calls [`DbConfig::from_env`] once at startup and hands the
//! resulting pool to every command handler. Nothing in this crate reads the
//! environment after that point.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Loads settings from the environment, reading a `.env` file if one is
    /// present. Only `DATABASE_URL` is required; the pool knobs fall back to
    /// defaults that suit a single bot process.
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL is not set (checked the environment and .env)".to_string())?;
        let max_connections = read_var("MENAGERIE_DB_MAX_CONNECTIONS", 8u32)?;
        let acquire_timeout_secs = read_var("MENAGERIE_DB_ACQUIRE_TIMEOUT_SECS", 5u64)?;
        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

fn read_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
