//! Shop session storage.
//!
//! A session holds the offline access token the app uses to call the Admin
//! API for a shop. Sessions are keyed by id (`offline_{shop}`) and deleted
//! by shop on uninstall.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use spin_swipe_core::ShopDomain;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::SessionStoreError;

// =============================================================================
// Types
// =============================================================================

/// An authorized session for one shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Session id (`offline_{shop}` for offline sessions).
    pub id: String,
    /// Shop the session belongs to.
    pub shop: ShopDomain,
    /// Whether the session is bound to a staff user.
    pub is_online: bool,
    /// Granted scopes, comma-separated.
    pub scope: String,
    /// Expiry, for online sessions.
    pub expires: Option<DateTime<Utc>>,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .field("scope", &self.scope)
            .field("expires", &self.expires)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopSession {
    /// Build the offline session for `shop`.
    #[must_use]
    pub fn offline(shop: ShopDomain, access_token: SecretString, scope: String) -> Self {
        Self {
            id: shop.offline_session_id(),
            shop,
            is_online: false,
            scope,
            expires: None,
            access_token,
        }
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopSessionRow {
    id: String,
    shop: String,
    is_online: bool,
    scope: String,
    expires: Option<DateTime<Utc>>,
    access_token: String,
}

impl TryFrom<ShopSessionRow> for ShopSession {
    type Error = SessionStoreError;

    fn try_from(row: ShopSessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            SessionStoreError::DataCorruption(format!("session {} has invalid shop: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            shop,
            is_online: row.is_online,
            scope: row.scope,
            expires: row.expires,
            access_token: SecretString::from(row.access_token),
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Persistence for shop sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session by id.
    async fn store(&self, session: &ShopSession) -> Result<(), SessionStoreError>;

    /// Load the offline session for a shop, if any.
    async fn load_offline(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError>;

    /// Delete every session of a shop, returning how many were removed.
    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError>;
}

/// `PostgreSQL`-backed session store.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn store(&self, session: &ShopSession) -> Result<(), SessionStoreError> {
        sqlx::query(
            r"
            INSERT INTO shopify_session (id, shop, is_online, scope, expires, access_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                shop = EXCLUDED.shop,
                is_online = EXCLUDED.is_online,
                scope = EXCLUDED.scope,
                expires = EXCLUDED.expires,
                access_token = EXCLUDED.access_token,
                updated_at = NOW()
            ",
        )
        .bind(&session.id)
        .bind(session.shop.as_str())
        .bind(session.is_online)
        .bind(&session.scope)
        .bind(session.expires)
        .bind(session.access_token.expose_secret())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_offline(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError> {
        let row = sqlx::query_as::<_, ShopSessionRow>(
            r"
            SELECT id, shop, is_online, scope, expires, access_token
            FROM shopify_session
            WHERE id = $1
            ",
        )
        .bind(shop.offline_session_id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShopSession::try_from).transpose()
    }

    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM shopify_session WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// In-memory session store for tests and local runs without a database.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, ShopSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn store(&self, session: &ShopSession) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load_offline(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&shop.offline_session_id())
            .cloned())
    }

    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| &session.shop != shop);
        Ok(u64::try_from(before - sessions.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(domain: &str) -> ShopDomain {
        ShopDomain::parse(domain).expect("valid shop")
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        let session = ShopSession::offline(
            shop("demo.myshopify.com"),
            SecretString::from("shpat_1"),
            "write_products".to_string(),
        );
        store.store(&session).await.expect("stored");

        let loaded = store
            .load_offline(&shop("demo.myshopify.com"))
            .await
            .expect("loaded")
            .expect("present");
        assert_eq!(loaded.id, "offline_demo.myshopify.com");
        assert_eq!(loaded.access_token.expose_secret(), "shpat_1");
    }

    #[tokio::test]
    async fn test_memory_store_replaces_by_id() {
        let store = MemorySessionStore::new();
        let demo = shop("demo.myshopify.com");
        store
            .store(&ShopSession::offline(demo.clone(), SecretString::from("old"), String::new()))
            .await
            .expect("stored");
        store
            .store(&ShopSession::offline(demo.clone(), SecretString::from("new"), String::new()))
            .await
            .expect("stored");

        assert_eq!(store.len().await, 1);
        let loaded = store.load_offline(&demo).await.expect("loaded").expect("present");
        assert_eq!(loaded.access_token.expose_secret(), "new");
    }

    #[tokio::test]
    async fn test_delete_by_shop_only_touches_that_shop() {
        let store = MemorySessionStore::new();
        for domain in ["a.myshopify.com", "b.myshopify.com"] {
            store
                .store(&ShopSession::offline(shop(domain), SecretString::from("t"), String::new()))
                .await
                .expect("stored");
        }

        assert_eq!(store.delete_by_shop(&shop("a.myshopify.com")).await.expect("deleted"), 1);
        assert_eq!(store.delete_by_shop(&shop("a.myshopify.com")).await.expect("deleted"), 0);
        assert!(
            store
                .load_offline(&shop("b.myshopify.com"))
                .await
                .expect("loaded")
                .is_some()
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = ShopSession::offline(
            shop("demo.myshopify.com"),
            SecretString::from("shpat_secret"),
            String::new(),
        );
        assert!(!format!("{session:?}").contains("shpat_secret"));
    }
}
