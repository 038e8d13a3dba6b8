//! CLI command implementations.

pub mod migrate;
pub mod provision;
pub mod sessions;

use spin_swipe_core::ShopDomain;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Shop argument is not a shop domain.
    #[error("Invalid shop: {0}")]
    InvalidShop(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(&database_url).await?)
}

/// Parse a `--shop` argument.
pub(crate) fn parse_shop(raw: &str) -> Result<ShopDomain, CommandError> {
    ShopDomain::parse(raw).map_err(|e| CommandError::InvalidShop(format!("{raw}: {e}")))
}
