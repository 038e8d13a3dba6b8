//! Public storefront settings: the shop's `/pages/menu` document.
//!
//! The page is public, so no credentials are involved. The body is parsed
//! fail-soft: anything that is not a JSON object with a truthy `menu` field
//! yields `menu: null`, as does a body over [`MAX_MENU_BODY_BYTES`].

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use spin_swipe_core::{ShopDomain, parse_or_none};
use thiserror::Error;
use tracing::instrument;

/// Largest menu page body that is read.
pub const MAX_MENU_BODY_BYTES: usize = 1024 * 1024;

/// The menu page could not be fetched.
#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {source}")]
pub struct MenuError {
    /// Requested URL.
    pub url: String,
    /// Transport error.
    #[source]
    pub source: reqwest::Error,
}

/// Response of the public settings endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicSettings {
    /// Shop the menu was read from.
    pub shop: ShopDomain,
    /// The `menu` field of the page, or `null`.
    pub menu: Value,
    /// RFC 3339 UTC time of the read, millisecond precision.
    pub timestamp: String,
}

/// Current time in the format the public endpoint reports.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// JavaScript-style truthiness.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Extract the menu from a page body.
#[must_use]
pub fn extract_menu(body: &str) -> Value {
    parse_or_none(body)
        .and_then(|mut document| document.get_mut("menu").map(Value::take))
        .filter(is_truthy)
        .unwrap_or(Value::Null)
}

/// Read the body, giving up with `None` once it passes `limit` bytes.
async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Option<Vec<u8>>, reqwest::Error> {
    if response
        .content_length()
        .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > limit))
    {
        return Ok(None);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Some(body))
}

/// Read `{origin}/pages/menu` for `shop`.
///
/// Any HTTP status is accepted; only transport failures are errors.
///
/// # Errors
///
/// Returns `MenuError` if the request or reading the body fails.
#[instrument(skip(client, origin), fields(shop = %shop))]
pub async fn fetch_public_settings(
    client: &reqwest::Client,
    origin: &str,
    shop: ShopDomain,
) -> Result<PublicSettings, MenuError> {
    let url = format!("{origin}/pages/menu");

    let body = async {
        let response = client.get(&url).send().await?;
        tracing::debug!(status = %response.status(), "Menu page fetched");
        read_capped(response, MAX_MENU_BODY_BYTES).await
    }
    .await
    .map_err(|source| MenuError {
        url: url.clone(),
        source,
    })?;

    let menu = match body {
        Some(body) => extract_menu(&String::from_utf8_lossy(&body)),
        None => {
            tracing::warn!(limit = MAX_MENU_BODY_BYTES, "Menu page too large, ignoring it");
            Value::Null
        }
    };

    Ok(PublicSettings {
        shop,
        menu,
        timestamp: timestamp_now(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_menu_present() {
        assert_eq!(
            extract_menu(r#"{"menu":{"items":["spin"]}}"#),
            json!({"items": ["spin"]})
        );
    }

    #[test]
    fn test_extract_menu_missing_field() {
        assert_eq!(extract_menu(r#"{"unexpected":true}"#), Value::Null);
    }

    #[test]
    fn test_extract_menu_falsy_values() {
        for body in [
            r#"{"menu":null}"#,
            r#"{"menu":false}"#,
            r#"{"menu":0}"#,
            r#"{"menu":""}"#,
        ] {
            assert_eq!(extract_menu(body), Value::Null, "{body}");
        }
        assert_eq!(extract_menu(r#"{"menu":[]}"#), json!([]));
    }

    #[test]
    fn test_extract_menu_not_json() {
        assert_eq!(extract_menu("<!doctype html><p>menu</p>"), Value::Null);
        assert_eq!(extract_menu(""), Value::Null);
        assert_eq!(extract_menu("[1,2]"), Value::Null);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'), "{ts}");
        let parsed = chrono::DateTime::parse_from_rfc3339(&ts).expect("rfc3339");
        assert_eq!(parsed.timestamp_subsec_nanos() % 1_000_000, 0);
        // YYYY-MM-DDTHH:MM:SS.mmmZ
        assert_eq!(ts.len(), 24);
    }
}
