//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::SessionStore;
use crate::shopify::ShopifyApp;
use crate::webhooks::WebhookRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the session store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: Option<PgPool>,
    shopify: ShopifyApp,
    sessions: Arc<dyn SessionStore>,
    webhooks: WebhookRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - App configuration
    /// * `pool` - `PostgreSQL` pool, checked by the readiness probe when present
    /// * `sessions` - Shop session store
    #[must_use]
    pub fn new(config: AppConfig, pool: Option<PgPool>, sessions: Arc<dyn SessionStore>) -> Self {
        let shopify = ShopifyApp::new(reqwest::Client::new(), config.shopify.clone());
        let webhooks = WebhookRegistry::standard(sessions.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                sessions,
                webhooks,
            }),
        }
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database pool, if the app runs with one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the Shopify app handle.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyApp {
        &self.inner.shopify
    }

    /// Get the shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        self.inner.shopify.http()
    }

    /// Get the shop session store.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.inner.sessions.as_ref()
    }

    /// Get the webhook registry.
    #[must_use]
    pub fn webhooks(&self) -> &WebhookRegistry {
        &self.inner.webhooks
    }
}
