//! Session tokens issued to the embedded admin frontend.
//!
//! A session token is an HS256 JWT signed with the app secret. The `aud`
//! claim must be the app's API key and `dest` names the shop the token was
//! issued for.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use spin_swipe_core::ShopDomain;
use thiserror::Error;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
pub const LEEWAY_SECS: u64 = 5;

/// Reasons a session token is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token issued for another app")]
    WrongAudience,
    #[error("token destination is not a shop: {0}")]
    InvalidDestination(String),
    #[error("token could not be signed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for SessionTokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAudience => Self::WrongAudience,
            _ => Self::Malformed,
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Shop admin URL that issued the token.
    pub iss: String,
    /// Shop origin (`https://{shop}`).
    pub dest: String,
    /// App API key.
    pub aud: String,
    /// Staff user id.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Not before (unix seconds).
    pub nbf: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Token id.
    #[serde(default)]
    pub jti: Option<String>,
    /// Admin session id.
    #[serde(default)]
    pub sid: Option<String>,
}

/// A session token that passed verification.
#[derive(Debug, Clone)]
pub struct VerifiedSessionToken {
    /// Shop the token was issued for.
    pub shop: ShopDomain,
    /// All claims.
    pub claims: SessionTokenClaims,
}

fn validation(api_key: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[api_key]);
    validation.set_required_spec_claims(&["exp", "nbf", "aud"]);
    validation.leeway = LEEWAY_SECS;
    validation.validate_nbf = true;
    validation
}

/// Verify a session token against the app credentials.
///
/// # Errors
///
/// Returns a `SessionTokenError` describing the first check that failed.
pub fn verify(token: &str, api_key: &str, api_secret: &str) -> Result<VerifiedSessionToken, SessionTokenError> {
    let data = jsonwebtoken::decode::<SessionTokenClaims>(
        token.trim(),
        &DecodingKey::from_secret(api_secret.as_bytes()),
        &validation(api_key),
    )?;
    let claims = data.claims;

    let shop = ShopDomain::from_origin(&claims.dest)
        .map_err(|_| SessionTokenError::InvalidDestination(claims.dest.clone()))?;

    Ok(VerifiedSessionToken { shop, claims })
}

/// Sign claims the way the platform does. Used by local tooling and tests.
///
/// # Errors
///
/// Returns an error if the claims cannot be encoded.
pub fn sign(claims: &SessionTokenClaims, api_secret: &str) -> Result<String, SessionTokenError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(api_secret.as_bytes()),
    )
    .map_err(|e| SessionTokenError::Signing(e.to_string()))
}

/// Claims for a token issued to `shop` for `api_key`, valid from `now` for a minute.
#[must_use]
pub fn claims_for(shop: &ShopDomain, api_key: &str, now: i64) -> SessionTokenClaims {
    SessionTokenClaims {
        iss: format!("https://{shop}/admin"),
        dest: format!("https://{shop}"),
        aud: api_key.to_string(),
        sub: Some("1".to_string()),
        exp: now.saturating_add(60),
        nbf: now,
        iat: now,
        jti: Some(uuid::Uuid::new_v4().to_string()),
        sid: None,
    }
}
