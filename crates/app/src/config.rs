//! App configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (sessions)
//! - `SHOPIFY_APP_URL` - Public URL the app is served from
//! - `SHOPIFY_API_KEY` - App client ID (also the session token audience)
//! - `SHOPIFY_API_SECRET` - App client secret (signs tokens, webhooks, proxy requests)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `SCOPES` - Comma-separated access scopes (default: `write_products,read_products`)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-04)
//! - `SHOP_CUSTOM_DOMAIN` - Extra shop domain accepted besides `*.myshopify.com`
//! - `SHOPIFY_ORIGIN_OVERRIDE` - Send all shop-bound traffic to this origin (local mocks)
//! - `MANAGEMENT_APP_URL` - Target of the landing page button
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sample rates

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use spin_swipe_core::ShopDomain;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2024-04";
const DEFAULT_SCOPES: &str = "write_products,read_products";
const DEFAULT_MANAGEMENT_APP_URL: &str = "https://shopify-management-app.vercel.app";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
///
/// Built once at startup and carried in [`crate::state::AppState`]; handlers
/// never read the environment themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the app, without trailing slash
    pub app_url: String,
    /// Shopify app credentials and API settings
    pub shopify: ShopifyAppConfig,
    /// Where the embedded landing page sends merchants
    pub management_app_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID
    pub api_key: String,
    /// App client secret
    pub api_secret: SecretString,
    /// Requested access scopes
    pub scopes: Vec<String>,
    /// Admin API version (e.g., 2024-04)
    pub api_version: String,
    /// Shop domains accepted in addition to `*.myshopify.com`
    pub custom_shop_domains: Vec<ShopDomain>,
    /// Origin used instead of `https://{shop}` for every shop-bound request
    pub origin_override: Option<Url>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("custom_shop_domains", &self.custom_shop_domains)
            .field("origin_override", &self.origin_override)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let app_url = parse_app_url(&get_required_env("SHOPIFY_APP_URL")?)?;
        let shopify = ShopifyAppConfig::from_env()?;
        let management_app_url =
            get_env_or_default("MANAGEMENT_APP_URL", DEFAULT_MANAGEMENT_APP_URL);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            app_url,
            shopify,
            management_app_url,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL of an app path (e.g. `/webhooks`).
    #[must_use]
    pub fn app_path(&self, path: &str) -> String {
        format!("{}{path}", self.app_url)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let custom_shop_domains = get_optional_env("SHOP_CUSTOM_DOMAIN")
            .map(|domain| {
                ShopDomain::parse(&domain).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOP_CUSTOM_DOMAIN".to_string(), e.to_string())
                })
            })
            .transpose()?
            .into_iter()
            .collect();

        let origin_override = get_optional_env("SHOPIFY_ORIGIN_OVERRIDE")
            .map(|origin| {
                Url::parse(&origin).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SHOPIFY_ORIGIN_OVERRIDE".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            scopes: parse_scopes(&get_env_or_default("SCOPES", DEFAULT_SCOPES)),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            custom_shop_domains,
            origin_override,
        })
    }

    /// Whether `shop` may start an OAuth flow against this app.
    #[must_use]
    pub fn accepts_shop(&self, shop: &ShopDomain) -> bool {
        shop.is_myshopify() || self.custom_shop_domains.contains(shop)
    }

    /// Base URL for requests addressed to `shop`, without trailing slash.
    #[must_use]
    pub fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.origin_override.as_ref().map_or_else(
            || format!("https://{shop}"),
            |origin| origin.as_str().trim_end_matches('/').to_string(),
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Split a comma-separated scope list, dropping blanks.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate the app URL and strip any trailing slash.
fn parse_app_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_APP_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_APP_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret issued by the Partner Dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopify_config() -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_key: "test_api_key".to_string(),
            api_secret: SecretString::from("super_secret_api_secret"),
            scopes: vec!["write_products".to_string()],
            api_version: DEFAULT_API_VERSION.to_string(),
            custom_shop_domains: vec![ShopDomain::parse("shop.example.com").unwrap()],
            origin_override: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_hex_secret() {
        let result = validate_secret_strength("9f8e2b7c41d06a35e8c1f4b92d7a60e3", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_scopes() {
        assert_eq!(
            parse_scopes("write_products, read_products,,"),
            vec!["write_products", "read_products"]
        );
        assert!(parse_scopes("").is_empty());
    }

    #[test]
    fn test_parse_app_url_strips_trailing_slash() {
        assert_eq!(
            parse_app_url("https://app.example.com/").unwrap(),
            "https://app.example.com"
        );
        assert!(parse_app_url("ftp://app.example.com").is_err());
        assert!(parse_app_url("not a url").is_err());
    }

    #[test]
    fn test_accepts_shop() {
        let config = shopify_config();
        assert!(config.accepts_shop(&ShopDomain::parse("foo.myshopify.com").unwrap()));
        assert!(config.accepts_shop(&ShopDomain::parse("shop.example.com").unwrap()));
        assert!(!config.accepts_shop(&ShopDomain::parse("evil.example.com").unwrap()));
    }

    #[test]
    fn test_shop_origin() {
        let shop = ShopDomain::parse("foo.myshopify.com").unwrap();
        let mut config = shopify_config();
        assert_eq!(config.shop_origin(&shop), "https://foo.myshopify.com");

        config.origin_override = Some(Url::parse("http://127.0.0.1:4000/").unwrap());
        assert_eq!(config.shop_origin(&shop), "http://127.0.0.1:4000");
    }

    #[test]
    fn test_socket_addr_and_app_path() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            app_url: "https://app.example.com".to_string(),
            shopify: shopify_config(),
            management_app_url: DEFAULT_MANAGEMENT_APP_URL.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.app_path("/webhooks"),
            "https://app.example.com/webhooks"
        );
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", shopify_config());

        assert!(debug_output.contains("test_api_key"));
        assert!(debug_output.contains("2024-04"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_secret"));
    }
}
