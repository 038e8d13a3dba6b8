//! HMAC signatures the platform attaches to requests it sends the app.
//!
//! Three schemes share the app secret:
//!
//! - OAuth redirects: hex HMAC over the sorted query, `k=v` joined by `&`,
//!   carried in the `hmac` parameter.
//! - App proxy requests: hex HMAC over the sorted query, `k=v` concatenated
//!   without a separator (repeated keys joined by `,`), carried in the
//!   `signature` parameter.
//! - Webhooks: base64 HMAC over the raw request body, carried in the
//!   `X-Shopify-Hmac-Sha256` header.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the OAuth redirect signature.
pub const OAUTH_HMAC_PARAM: &str = "hmac";

/// Query parameter carrying the app proxy signature.
pub const PROXY_SIGNATURE_PARAM: &str = "signature";

fn mac_bytes(secret: &str, message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Group query pairs by key, dropping the signature parameters.
fn grouped(params: &[(String, String)]) -> BTreeMap<&str, Vec<&str>> {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        if key == OAUTH_HMAC_PARAM || key == PROXY_SIGNATURE_PARAM {
            continue;
        }
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }
    grouped
}

/// Compute the OAuth redirect signature for `params`.
#[must_use]
pub fn sign_query(params: &[(String, String)], secret: &str) -> String {
    let message = grouped(params)
        .into_iter()
        .map(|(k, v)| format!("{k}={}", v.join(",")))
        .collect::<Vec<_>>()
        .join("&");

    mac_bytes(secret, message.as_bytes()).map(hex::encode).unwrap_or_default()
}

/// Verify the `hmac` parameter of an OAuth redirect.
#[must_use]
pub fn verify_query_hmac(params: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = params.iter().find(|(k, _)| k == OAUTH_HMAC_PARAM) else {
        return false;
    };

    constant_time_compare(&sign_query(params, secret), provided)
}

/// Compute the app proxy signature for `params`.
#[must_use]
pub fn sign_proxy_query(params: &[(String, String)], secret: &str) -> String {
    let message: String = grouped(params)
        .into_iter()
        .map(|(k, v)| format!("{k}={}", v.join(",")))
        .collect();

    mac_bytes(secret, message.as_bytes()).map(hex::encode).unwrap_or_default()
}

/// Verify the `signature` parameter of an app proxy request.
#[must_use]
pub fn verify_proxy_signature(params: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = params.iter().find(|(k, _)| k == PROXY_SIGNATURE_PARAM) else {
        return false;
    };

    constant_time_compare(&sign_proxy_query(params, secret), provided)
}

/// Compute the webhook signature for a raw body.
#[must_use]
pub fn sign_webhook(body: &[u8], secret: &str) -> String {
    mac_bytes(secret, body).map(|mac| STANDARD.encode(mac)).unwrap_or_default()
}

/// Verify the `X-Shopify-Hmac-Sha256` header against the raw body.
#[must_use]
pub fn verify_webhook_hmac(body: &[u8], provided: &str, secret: &str) -> bool {
    !provided.is_empty() && constant_time_compare(&sign_webhook(body, secret), provided.trim())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "hush";

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_query_hmac_ignores_order() {
        let mut params = pairs(&[
            ("shop", "demo.myshopify.com"),
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("timestamp", "1337178173"),
        ]);
        let signature = sign_query(&params, SECRET);
        params.insert(0, ("hmac".to_string(), signature));
        params.reverse();
        assert!(verify_query_hmac(&params, SECRET));
    }

    #[test]
    fn test_query_hmac_rejects_tampering() {
        let mut params = pairs(&[("shop", "demo.myshopify.com"), ("code", "abc")]);
        let signature = sign_query(&params, SECRET);
        params.push(("hmac".to_string(), signature));
        params[0].1 = "evil.myshopify.com".to_string();
        assert!(!verify_query_hmac(&params, SECRET));
    }

    #[test]
    fn test_query_hmac_requires_param() {
        let params = pairs(&[("shop", "demo.myshopify.com")]);
        assert!(!verify_query_hmac(&params, SECRET));
    }

    #[test]
    fn test_proxy_message_has_no_separator() {
        // Same pairs, different scheme: the two signatures must differ.
        let params = pairs(&[("shop", "demo.myshopify.com"), ("path_prefix", "/apps/spin")]);
        assert_ne!(sign_query(&params, SECRET), sign_proxy_query(&params, SECRET));

        let expected = mac_bytes(SECRET, b"path_prefix=/apps/spinshop=demo.myshopify.com")
            .map(hex::encode)
            .expect("mac");
        assert_eq!(sign_proxy_query(&params, SECRET), expected);
    }

    #[test]
    fn test_proxy_repeated_keys_are_comma_joined() {
        let params = pairs(&[("ids", "1"), ("ids", "2"), ("shop", "demo.myshopify.com")]);
        let expected = mac_bytes(SECRET, b"ids=1,2shop=demo.myshopify.com")
            .map(hex::encode)
            .expect("mac");
        assert_eq!(sign_proxy_query(&params, SECRET), expected);
    }

    #[test]
    fn test_proxy_signature_roundtrip() {
        let mut params = pairs(&[("shop", "demo.myshopify.com"), ("timestamp", "1700000000")]);
        let signature = sign_proxy_query(&params, SECRET);
        params.push(("signature".to_string(), signature));
        assert!(verify_proxy_signature(&params, SECRET));
        assert!(!verify_proxy_signature(&params, "other"));
    }

    #[test]
    fn test_webhook_hmac() {
        let body = br#"{"id":1}"#;
        let signature = sign_webhook(body, SECRET);
        assert!(verify_webhook_hmac(body, &signature, SECRET));
        assert!(!verify_webhook_hmac(br#"{"id":2}"#, &signature, SECRET));
        assert!(!verify_webhook_hmac(body, "", SECRET));
    }
}
