//! Cookie session configuration.
//!
//! The app only keeps the OAuth `state` nonce in the browser session, so the
//! cookie is short-lived. `SameSite=Lax` is required: the OAuth callback is a
//! top-level navigation coming back from the shop's admin.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "spin_swipe_session";

/// Session expiry time in seconds (the length of an install handshake).
const SESSION_EXPIRY_SECONDS: i64 = 10 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// Uses the store's default `tower_sessions.session` table, created by the
/// app migrations.
#[must_use]
pub fn create_session_layer(pool: &PgPool, config: &AppConfig) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    // Determine if we're in production (HTTPS)
    let is_secure = config.app_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
