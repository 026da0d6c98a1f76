// Library entry for the persistence layer. The Discord bot binary and the
// battle engine both depend on this crate and drive it through the
// `database` modules.
pub mod config;
pub mod constants;
pub mod database;
pub mod util;

// Convenient re-exports for the types callers touch on every request.
pub use config::DbConfig;
pub use database::init::DbPool;
