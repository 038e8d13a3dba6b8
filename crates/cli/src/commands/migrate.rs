//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ss-cli migrate
//! ```
//!
//! Applies `crates/app/migrations/`: the `shopify_session` table and the
//! `tower_sessions` schema used by the OAuth cookie session.

use spin_swipe_app::db::MIGRATOR;
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Connection setup failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
