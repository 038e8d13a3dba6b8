//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is a single label with no dot.
    #[error("shop domain must contain at least one dot")]
    MissingDot,
    /// A label is empty, too long, or starts/ends with a hyphen.
    #[error("invalid label in shop domain: {0:?}")]
    InvalidLabel(String),
    /// The input contains a character outside `[a-z0-9.-]`.
    #[error("invalid character in shop domain: {0:?}")]
    InvalidCharacter(char),
    /// The input is an IP address rather than a host name.
    #[error("shop domain cannot be an IP address: {0}")]
    IpLiteral(String),
}

/// A shop's domain, the tenant key for sessions and metafields.
///
/// Only bare host names are accepted: no scheme, port, path, or userinfo.
/// Input is trimmed and lowercased before validation, so the stored value is
/// canonical and can be compared directly.
///
/// ## Examples
///
/// ```
/// use spin_swipe_core::ShopDomain;
///
/// let shop = ShopDomain::parse("Foo.myshopify.com").unwrap();
/// assert_eq!(shop.as_str(), "foo.myshopify.com");
/// assert!(shop.is_myshopify());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("localhost").is_err());
/// assert!(ShopDomain::parse("evil.com/path").is_err());
/// assert!(ShopDomain::parse("evil.com:8080").is_err());
/// assert!(ShopDomain::parse("169.254.169.254").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a DNS host name.
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length of a single DNS label.
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Suffix of platform-issued shop domains.
    pub const MYSHOPIFY_SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, has no dot, contains
    /// characters other than ASCII letters, digits, `.` and `-`, has a
    /// malformed label, or is an IP address (any all-digit top-level label).
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim().to_ascii_lowercase();

        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(ShopDomainError::InvalidCharacter(c));
        }

        if !s.contains('.') {
            return Err(ShopDomainError::MissingDot);
        }

        for label in s.split('.') {
            if label.is_empty()
                || label.len() > Self::MAX_LABEL_LENGTH
                || label.starts_with('-')
                || label.ends_with('-')
            {
                return Err(ShopDomainError::InvalidLabel(label.to_owned()));
            }
        }

        // No real TLD is numeric; this also covers dotted-quad addresses.
        if s.rsplit('.')
            .next()
            .is_some_and(|tld| tld.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ShopDomainError::IpLiteral(s));
        }

        Ok(Self(s))
    }

    /// Parse the host of an `https://` URL such as a session token `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host part is not a valid shop domain.
    pub fn from_origin(origin: &str) -> Result<Self, ShopDomainError> {
        let host = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"))
            .unwrap_or(origin);
        let host = host.split('/').next().unwrap_or_default();
        Self::parse(host)
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this is a platform-issued `*.myshopify.com` domain.
    #[must_use]
    pub fn is_myshopify(&self) -> bool {
        self.0.ends_with(Self::MYSHOPIFY_SUFFIX) && self.0.len() > Self::MYSHOPIFY_SUFFIX.len()
    }

    /// The id of the offline session stored for this shop.
    #[must_use]
    pub fn offline_session_id(&self) -> String {
        format!("offline_{}", self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("foo.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-shop.myshopify.com").is_ok());
        assert!(ShopDomain::parse("shop.example.co.uk").is_ok());
        assert!(ShopDomain::parse("a1.b2").is_ok());
    }

    #[test]
    fn test_parse_canonicalizes() {
        let shop = ShopDomain::parse("  FOO.MyShopify.com ").unwrap();
        assert_eq!(shop.as_str(), "foo.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_rejects_url_parts() {
        assert!(matches!(
            ShopDomain::parse("https://foo.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter(':'))
        ));
        assert!(matches!(
            ShopDomain::parse("foo.com/pages"),
            Err(ShopDomainError::InvalidCharacter('/'))
        ));
        assert!(matches!(
            ShopDomain::parse("user@foo.com"),
            Err(ShopDomainError::InvalidCharacter('@'))
        ));
        assert!(matches!(
            ShopDomain::parse("foo.com?x=1"),
            Err(ShopDomainError::InvalidCharacter('?'))
        ));
    }

    #[test]
    fn test_parse_missing_dot() {
        assert_eq!(
            ShopDomain::parse("localhost"),
            Err(ShopDomainError::MissingDot)
        );
    }

    #[test]
    fn test_parse_bad_labels() {
        assert!(matches!(
            ShopDomain::parse("foo..com"),
            Err(ShopDomainError::InvalidLabel(_))
        ));
        assert!(matches!(
            ShopDomain::parse("-foo.com"),
            Err(ShopDomainError::InvalidLabel(_))
        ));
        assert!(matches!(
            ShopDomain::parse(".foo.com"),
            Err(ShopDomainError::InvalidLabel(_))
        ));
        let long_label = format!("{}.com", "a".repeat(64));
        assert!(matches!(
            ShopDomain::parse(&long_label),
            Err(ShopDomainError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_parse_rejects_ip_literals() {
        for input in ["169.254.169.254", "127.0.0.1", "10.0.0.1", "0.0.0.0", " 127.0.0.1 "] {
            assert_eq!(
                ShopDomain::parse(input),
                Err(ShopDomainError::IpLiteral(input.trim().to_string())),
                "{input}"
            );
        }
        // Numeric-looking hosts that still end in a name are fine
        assert!(ShopDomain::parse("123.myshopify.com").is_ok());
        assert!(ShopDomain::from_origin("https://169.254.169.254/latest/meta-data").is_err());
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.com", vec!["a".repeat(60); 5].join("."));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_from_origin() {
        let shop = ShopDomain::from_origin("https://foo.myshopify.com").unwrap();
        assert_eq!(shop.as_str(), "foo.myshopify.com");

        let shop = ShopDomain::from_origin("https://foo.myshopify.com/admin").unwrap();
        assert_eq!(shop.as_str(), "foo.myshopify.com");

        assert!(ShopDomain::from_origin("https://").is_err());
    }

    #[test]
    fn test_is_myshopify() {
        assert!(ShopDomain::parse("foo.myshopify.com").unwrap().is_myshopify());
        assert!(!ShopDomain::parse("shop.example.com").unwrap().is_myshopify());
    }

    #[test]
    fn test_offline_session_id() {
        let shop = ShopDomain::parse("foo.myshopify.com").unwrap();
        assert_eq!(shop.offline_session_id(), "offline_foo.myshopify.com");
    }

    #[test]
    fn test_serde_validates() {
        let shop: ShopDomain = serde_json::from_str("\"Foo.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "foo.myshopify.com");
        assert_eq!(
            serde_json::to_string(&shop).unwrap(),
            "\"foo.myshopify.com\""
        );

        assert!(serde_json::from_str::<ShopDomain>("\"not a shop\"").is_err());
    }
}
