//! Shop session maintenance.
//!
//! # Usage
//!
//! ```bash
//! ss-cli sessions purge --shop demo.myshopify.com
//! ```

use spin_swipe_app::db::{PgSessionStore, SessionStore, SessionStoreError};
use thiserror::Error;

use super::{CommandError, connect, parse_shop};

/// Errors that can occur during session maintenance.
#[derive(Debug, Error)]
pub enum SessionsError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Session store error: {0}")]
    Store(#[from] SessionStoreError),
}

/// Delete every stored session for `shop`, as an uninstall would.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn purge(shop: &str) -> Result<u64, SessionsError> {
    let shop = parse_shop(shop)?;
    let pool = connect().await?;

    let deleted = PgSessionStore::new(pool).delete_by_shop(&shop).await?;
    tracing::info!(shop = %shop, deleted, "Sessions purged");
    Ok(deleted)
}
