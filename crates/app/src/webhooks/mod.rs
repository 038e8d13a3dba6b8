//! Webhook topics, handlers and dispatch.
//!
//! The HTTP route authenticates a delivery and builds a [`WebhookContext`];
//! the [`WebhookRegistry`] hands it to the handler registered for the topic.
//! Handler errors are returned to the route, which logs them and still
//! acknowledges the delivery.

mod install;
mod products_update;
mod uninstall;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use spin_swipe_core::ShopDomain;
use thiserror::Error;

use crate::db::{SessionStore, SessionStoreError};
use crate::shopify::{AdminClient, AdminShopifyError};

pub use install::{InstallHandler, provision_definitions};
pub use products_update::ProductsUpdateHandler;
pub use uninstall::UninstallHandler;

/// Webhook topics the app acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `app/installed`
    AppInstalled,
    /// `app/uninstalled`
    AppUninstalled,
    /// `products/update`
    ProductsUpdate,
}

impl Topic {
    /// Topics the app subscribes to after OAuth.
    ///
    /// `app/installed` is not a subscribable topic; install provisioning runs
    /// from the OAuth callback instead.
    pub const SUBSCRIBED: [Self; 2] = [Self::AppUninstalled, Self::ProductsUpdate];

    /// Parse the `X-Shopify-Topic` header value.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim() {
            "app/installed" => Some(Self::AppInstalled),
            "app/uninstalled" => Some(Self::AppUninstalled),
            "products/update" => Some(Self::ProductsUpdate),
            _ => None,
        }
    }

    /// Header form of the topic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AppInstalled => "app/installed",
            Self::AppUninstalled => "app/uninstalled",
            Self::ProductsUpdate => "products/update",
        }
    }

    /// `WebhookSubscriptionTopic` enum name in the Admin API.
    #[must_use]
    pub const fn graphql_name(&self) -> &'static str {
        match self {
            Self::AppInstalled => "APP_INSTALLED",
            Self::AppUninstalled => "APP_UNINSTALLED",
            Self::ProductsUpdate => "PRODUCTS_UPDATE",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookContext {
    /// Delivery topic.
    pub topic: Topic,
    /// Shop the event concerns.
    pub shop: ShopDomain,
    /// Parsed JSON body (`Value::Null` if the body was not JSON).
    pub payload: Value,
    /// `X-Shopify-Webhook-Id`, when present.
    pub webhook_id: Option<String>,
    /// `X-Shopify-API-Version`, when present.
    pub api_version: Option<String>,
    /// Admin client from the shop's offline session, when one exists.
    pub admin: Option<AdminClient>,
}

/// Errors raised by webhook handlers and install provisioning.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// The shop has no offline session to call the Admin API with.
    #[error("No offline session for {0}")]
    NoSession(ShopDomain),

    /// Admin API call failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Some definitions could not be created.
    #[error("Definitions not provisioned: {}", .0.join(", "))]
    Definitions(Vec<String>),

    /// Session storage failed.
    #[error("Session store error: {0}")]
    Storage(#[from] SessionStoreError),
}

/// Handles deliveries for one topic.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Act on a delivery.
    async fn handle(&self, ctx: &WebhookContext) -> Result<(), ProvisioningError>;
}

/// Outcome of dispatching a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran and succeeded.
    Handled,
    /// No handler is registered for the topic.
    Unhandled,
}

/// Maps topics to handlers.
#[derive(Default)]
pub struct WebhookRegistry {
    handlers: HashMap<Topic, Box<dyn WebhookHandler>>,
}

impl fmt::Debug for WebhookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRegistry")
            .field("topics", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WebhookRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the app's handlers for every [`Topic`].
    #[must_use]
    pub fn standard(sessions: Arc<dyn SessionStore>) -> Self {
        Self::new()
            .with(Topic::AppInstalled, InstallHandler)
            .with(Topic::AppUninstalled, UninstallHandler::new(sessions))
            .with(Topic::ProductsUpdate, ProductsUpdateHandler)
    }

    /// Register `handler` for `topic`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, topic: Topic, handler: impl WebhookHandler + 'static) -> Self {
        self.handlers.insert(topic, Box::new(handler));
        self
    }

    /// Whether a handler is registered for `topic`.
    #[must_use]
    pub fn handles(&self, topic: Topic) -> bool {
        self.handlers.contains_key(&topic)
    }

    /// Run the handler registered for the delivery's topic.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn dispatch(&self, ctx: &WebhookContext) -> Result<Dispatch, ProvisioningError> {
        let Some(handler) = self.handlers.get(&ctx.topic) else {
            return Ok(Dispatch::Unhandled);
        };
        handler.handle(ctx).await?;
        Ok(Dispatch::Handled)
    }
}
