//! Re-run install provisioning for one shop.
//!
//! Install provisioning normally runs from the `app/installed` path; this
//! command repeats it with the shop's stored offline session, for shops
//! where the definitions were never created or were deleted since.

use spin_swipe_app::config::{AppConfig, ConfigError};
use spin_swipe_app::db::{PgSessionStore, SessionStore, SessionStoreError};
use spin_swipe_app::shopify::ShopifyApp;
use spin_swipe_app::webhooks::{ProvisioningError, provision_definitions};
use thiserror::Error;

use super::{CommandError, connect, parse_shop};

/// Errors that can occur while provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session lookup failed: {0}")]
    Sessions(#[from] SessionStoreError),

    #[error("No offline session stored for {0}; install the app first")]
    NoSession(String),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
}

/// Create the product metafield definitions for `shop`.
///
/// # Errors
///
/// Returns an error if the shop has no offline session or any definition
/// could not be created.
pub async fn run(shop: &str) -> Result<(), ProvisionError> {
    let shop = parse_shop(shop)?;
    let config = AppConfig::from_env()?;
    let pool = connect().await?;

    let sessions = PgSessionStore::new(pool);
    let session = sessions
        .load_offline(&shop)
        .await?
        .ok_or_else(|| ProvisionError::NoSession(shop.to_string()))?;

    let shopify = ShopifyApp::new(reqwest::Client::new(), config.shopify);
    let admin = shopify.admin_client(&session);

    let outcomes = provision_definitions(&admin).await?;
    for outcome in &outcomes {
        tracing::info!(shop = %shop, ?outcome, "Metafield definition");
    }

    tracing::info!(shop = %shop, "Provisioning complete!");
    Ok(())
}
