//! Unified error handling for the app's HTTP surface.
//!
//! Every failure leaves as a JSON body with an `error` string.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::SessionStoreError;
use crate::shopify::{AdminShopifyError, MetafieldError};

/// Body of every 401 from the session resolver.
pub const UNAUTHENTICATED_MESSAGE: &str = "Shop session missing or invalid";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] SessionStoreError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Metafield read or write failed.
    #[error("Metafield error: {0}")]
    Metafield(#[from] MetafieldError),

    /// A required parameter is absent or unusable; the message is returned as is.
    #[error("{0}")]
    MissingParameter(&'static str),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No shop could be resolved from the request.
    #[error("Shop session missing or invalid")]
    Unauthenticated,

    /// A platform signature did not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An upstream call failed; `public` is what the client sees.
    #[error("{public}: {detail}")]
    Upstream {
        /// Client-facing message.
        public: &'static str,
        /// Logged cause.
        detail: String,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap an upstream failure with a fixed client-facing message.
    pub fn upstream(public: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Upstream {
            public,
            detail: detail.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_)
            | Self::Shopify(_)
            | Self::Upstream { .. }
            | Self::Internal(_)
            | Self::Metafield(MetafieldError::OwnerResolution(_) | MetafieldError::Shopify(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Metafield(MetafieldError::ProductNotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::MissingParameter(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(_) | Self::Metafield(MetafieldError::Shopify(_)) => {
                "Shopify request failed".to_string()
            }
            Self::Metafield(MetafieldError::OwnerResolution(_)) => {
                "Could not resolve shop owner id".to_string()
            }
            Self::Metafield(MetafieldError::ProductNotFound(_)) => "Product not found".to_string(),
            Self::Upstream { public, .. } => (*public).to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
