//! App-level Shopify operations: OAuth, token exchange and client construction.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use spin_swipe_core::ShopDomain;
use tracing::instrument;

use super::{AdminClient, AdminShopifyError};
use crate::config::ShopifyAppConfig;
use crate::db::ShopSession;

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";
const OFFLINE_TOKEN_TYPE: &str = "urn:shopify:params:oauth:token-type:offline-access-token";

/// An offline access token obtained from OAuth or token exchange.
#[derive(Clone)]
pub struct OfflineAccessToken {
    /// Shop the token belongs to.
    pub shop: ShopDomain,
    /// The access token.
    pub access_token: SecretString,
    /// Granted scopes, comma-separated.
    pub scope: String,
}

impl std::fmt::Debug for OfflineAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineAccessToken")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

impl From<OfflineAccessToken> for ShopSession {
    fn from(token: OfflineAccessToken) -> Self {
        Self::offline(token.shop, token.access_token, token.scope)
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
}

/// The app's Shopify credentials plus a shared HTTP client.
///
/// Created once at startup; clones share the same client.
#[derive(Clone)]
pub struct ShopifyApp {
    inner: Arc<ShopifyAppInner>,
}

struct ShopifyAppInner {
    client: reqwest::Client,
    config: ShopifyAppConfig,
}

impl std::fmt::Debug for ShopifyApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyApp")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ShopifyApp {
    /// Create the app handle.
    #[must_use]
    pub fn new(client: reqwest::Client, config: ShopifyAppConfig) -> Self {
        Self {
            inner: Arc::new(ShopifyAppInner { client, config }),
        }
    }

    /// App configuration.
    #[must_use]
    pub fn config(&self) -> &ShopifyAppConfig {
        &self.inner.config
    }

    /// App client ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.config.api_key
    }

    /// App client secret (for HMAC and session token verification).
    #[must_use]
    pub fn api_secret(&self) -> &str {
        self.inner.config.api_secret.expose_secret()
    }

    /// Shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Base URL for requests addressed to `shop`.
    #[must_use]
    pub fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.inner.config.shop_origin(shop)
    }

    /// Build an Admin API client from a stored session.
    #[must_use]
    pub fn admin_client(&self, session: &ShopSession) -> AdminClient {
        AdminClient::new(
            self.inner.client.clone(),
            session.shop.clone(),
            &self.shop_origin(&session.shop),
            &self.inner.config.api_version,
            session.access_token.clone(),
        )
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL for `shop`.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, redirect_uri: &str, state: &str) -> String {
        let scope = self.inner.config.scopes.join(",");
        format!(
            "{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            self.shop_origin(shop),
            urlencoding::encode(&self.inner.config.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if the exchange is refused, or
    /// `AdminShopifyError::Http` if the request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<OfflineAccessToken, AdminShopifyError> {
        let params = [
            ("client_id", self.api_key()),
            ("client_secret", self.api_secret()),
            ("code", code),
        ];
        self.request_access_token(shop, &params).await
    }

    /// Exchange a verified session token for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if the exchange is refused, or
    /// `AdminShopifyError::Http` if the request fails.
    #[instrument(skip(self, session_token), fields(shop = %shop))]
    pub async fn exchange_session_token(
        &self,
        shop: &ShopDomain,
        session_token: &str,
    ) -> Result<OfflineAccessToken, AdminShopifyError> {
        let params = [
            ("client_id", self.api_key()),
            ("client_secret", self.api_secret()),
            ("grant_type", TOKEN_EXCHANGE_GRANT),
            ("subject_token", session_token),
            ("subject_token_type", ID_TOKEN_TYPE),
            ("requested_token_type", OFFLINE_TOKEN_TYPE),
        ];
        self.request_access_token(shop, &params).await
    }

    async fn request_access_token(
        &self,
        shop: &ShopDomain,
        params: &[(&str, &str)],
    ) -> Result<OfflineAccessToken, AdminShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_origin(shop));

        let response = self.inner.client.post(&url).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdminShopifyError::OAuth(format!(
                "Token request failed ({status}): {text}"
            )));
        }

        let token: AccessTokenResponse = response.json().await?;

        Ok(OfflineAccessToken {
            shop: shop.clone(),
            access_token: SecretString::from(token.access_token),
            scope: token.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(origin_override: Option<&str>) -> ShopifyApp {
        ShopifyApp::new(
            reqwest::Client::new(),
            ShopifyAppConfig {
                api_key: "app-key".to_string(),
                api_secret: SecretString::from("kX9#mP2$vL5@nQ8&wR3!"),
                scopes: vec!["write_products".to_string(), "read_products".to_string()],
                api_version: "2024-04".to_string(),
                custom_shop_domains: vec![],
                origin_override: origin_override.map(|o| url::Url::parse(o).expect("valid url")),
            },
        )
    }

    #[test]
    fn test_authorization_url() {
        let shop = ShopDomain::parse("demo.myshopify.com").expect("valid shop");
        let url = app(None).authorization_url(&shop, "https://app.test/auth/callback", "abc");
        assert_eq!(
            url,
            "https://demo.myshopify.com/admin/oauth/authorize?client_id=app-key\
             &scope=write_products%2Cread_products\
             &redirect_uri=https%3A%2F%2Fapp.test%2Fauth%2Fcallback&state=abc"
        );
    }

    #[test]
    fn test_origin_override_applies_to_admin_endpoint() {
        let shop = ShopDomain::parse("demo.myshopify.com").expect("valid shop");
        let app = app(Some("http://127.0.0.1:9999/"));
        assert_eq!(app.shop_origin(&shop), "http://127.0.0.1:9999");

        let session = ShopSession::offline(shop, SecretString::from("shpat_x"), String::new());
        let client = app.admin_client(&session);
        assert_eq!(client.shop().as_str(), "demo.myshopify.com");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = OfflineAccessToken {
            shop: ShopDomain::parse("demo.myshopify.com").expect("valid shop"),
            access_token: SecretString::from("shpat_secret"),
            scope: "write_products".to_string(),
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("shpat_secret"));
    }
}
