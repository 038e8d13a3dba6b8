//! Shopify Admin API GraphQL client.
//!
//! An [`AdminClient`] is bound to one shop and one offline access token. It
//! is cheap to build and is created per request from the stored session, so
//! there is no token cache to invalidate.

use std::sync::Arc;

use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use spin_swipe_core::ShopDomain;

use super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation};

pub mod metafields;
pub mod provisioning;
pub mod queries;

/// Shopify Admin API GraphQL client for a single shop.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    shop: ShopDomain,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("shop", &self.inner.shop)
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `shop` - Shop the token belongs to
    /// * `origin` - Base URL for the shop (normally `https://{shop}`)
    /// * `api_version` - Admin API version (e.g., 2024-04)
    /// * `access_token` - Offline access token for the shop
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        shop: ShopDomain,
        origin: &str,
        api_version: &str,
        access_token: SecretString,
    ) -> Self {
        let endpoint = format!("{origin}/admin/api/{api_version}/graphql.json");

        Self {
            inner: Arc::new(AdminClientInner {
                client,
                shop,
                endpoint,
                access_token,
            }),
        }
    }

    /// Get the shop this client is authorized for.
    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split('.').next())
                .and_then(|s| s.parse().ok())
                .unwrap_or(2);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if matches!(
            response.status(),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = response.json().await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(AdminShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            AdminShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }
}
