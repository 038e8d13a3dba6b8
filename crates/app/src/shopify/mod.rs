//! Shopify platform integration.
//!
//! # Architecture
//!
//! - [`ShopifyApp`] holds the app credentials and builds per-shop clients;
//!   it is created once at startup and lives in `AppState` (no global app
//!   instance).
//! - [`AdminClient`] is an authorized Admin API client for one shop, built
//!   from a stored session for the lifetime of a request or webhook.
//! - [`hmac`] and [`session_token`] verify the signed material the platform
//!   attaches to OAuth callbacks, webhooks, app proxy requests and embedded
//!   API calls.
//! - Direct API calls to Shopify; no local sync and no caching.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = ShopifyApp::new(&config.shopify);
//! let admin = app.admin_client(&session);
//!
//! let selection = admin.get_spinning_selection().await?;
//! admin.set_spinning_selection(&serde_json::json!({"tool": "wheel"})).await?;
//! ```

mod admin;
mod app;
pub mod hmac;
pub mod session_token;
pub mod types;

pub use admin::AdminClient;
pub use admin::metafields::{MetafieldError, SetConfirmation, SpinSwipeSettings, SpinSwipeUpdate};
pub use admin::provisioning::{DefinitionOutcome, WebhookRegistration};
pub use app::{OfflineAccessToken, ShopifyApp};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth code or token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
