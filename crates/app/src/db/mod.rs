//! Database operations for the app's `PostgreSQL`.
//!
//! ## Tables
//!
//! - `shopify_session` - OAuth sessions, one offline session per shop
//! - `tower_sessions.session` - Browser sessions (OAuth `state` only)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p spin-swipe-cli -- migrate
//! ```

pub mod sessions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use sessions::{MemorySessionStore, PgSessionStore, SessionStore, ShopSession};

/// Embedded migrations for the app database.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
