//! Shopify global IDs (`gid://shopify/{Type}/{id}`).
//!
//! Metafield writes address their owner by global id, never by the shop
//! domain or a numeric REST id, so everything that crosses into a write call
//! goes through [`GlobalId`].

use core::fmt;

use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a [`GlobalId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GlobalIdError {
    /// The input does not start with `gid://shopify/`.
    #[error("global id must start with gid://shopify/")]
    MissingPrefix,
    /// The resource type segment is missing.
    #[error("global id is missing a resource type")]
    MissingType,
    /// The id segment is missing.
    #[error("global id is missing a resource id")]
    MissingId,
    /// A bare id was expected to be numeric.
    #[error("not a numeric id: {0:?}")]
    NotNumeric(String),
    /// The gid addresses a different resource type.
    #[error("expected a {expected} id, got {actual}")]
    WrongType {
        /// Resource type required by the caller.
        expected: &'static str,
        /// Resource type found in the gid.
        actual: String,
    },
}

/// An opaque Shopify global identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct GlobalId(String);

impl GlobalId {
    /// Parse a `GlobalId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not of the form
    /// `gid://shopify/{Type}/{id}`.
    pub fn parse(s: &str) -> Result<Self, GlobalIdError> {
        let rest = s.strip_prefix(GID_PREFIX).ok_or(GlobalIdError::MissingPrefix)?;
        let (resource, id) = rest.split_once('/').ok_or(GlobalIdError::MissingId)?;

        if resource.is_empty() {
            return Err(GlobalIdError::MissingType);
        }
        if id.is_empty() {
            return Err(GlobalIdError::MissingId);
        }

        Ok(Self(s.to_owned()))
    }

    /// Build a product global id from either a numeric id or a full gid.
    ///
    /// ```
    /// use spin_swipe_core::GlobalId;
    ///
    /// let a = GlobalId::product("42").unwrap();
    /// let b = GlobalId::product("gid://shopify/Product/42").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.numeric_id(), Some(42));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither numeric nor a valid gid.
    pub fn product(id: &str) -> Result<Self, GlobalIdError> {
        if id.starts_with(GID_PREFIX) {
            let gid = Self::parse(id)?;
            if gid.resource_type() != "Product" {
                return Err(GlobalIdError::WrongType {
                    expected: "Product",
                    actual: gid.resource_type().to_owned(),
                });
            }
            return Ok(gid);
        }
        let numeric: u64 = id
            .parse()
            .map_err(|_| GlobalIdError::NotNumeric(id.to_owned()))?;
        Ok(Self(format!("{GID_PREFIX}Product/{numeric}")))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource type segment (e.g. `Shop`, `Product`).
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.0
            .trim_start_matches(GID_PREFIX)
            .split('/')
            .next()
            .unwrap_or_default()
    }

    /// The trailing id segment as a number, if it is one.
    #[must_use]
    pub fn numeric_id(&self) -> Option<u64> {
        self.0
            .rsplit('/')
            .next()
            .and_then(|tail| tail.split('?').next())
            .and_then(|n| n.parse().ok())
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GlobalId {
    type Error = GlobalIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GlobalId> for String {
    fn from(id: GlobalId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shop_gid() {
        let id = GlobalId::parse("gid://shopify/Shop/548380009").unwrap();
        assert_eq!(id.resource_type(), "Shop");
        assert_eq!(id.numeric_id(), Some(548_380_009));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(GlobalId::parse(""), Err(GlobalIdError::MissingPrefix));
        assert_eq!(GlobalId::parse("123"), Err(GlobalIdError::MissingPrefix));
        assert_eq!(
            GlobalId::parse("gid://shopify/Shop"),
            Err(GlobalIdError::MissingId)
        );
        assert_eq!(
            GlobalId::parse("gid://shopify/Shop/"),
            Err(GlobalIdError::MissingId)
        );
        assert_eq!(
            GlobalId::parse("gid://shopify//1"),
            Err(GlobalIdError::MissingType)
        );
    }

    #[test]
    fn test_product_from_numeric() {
        let id = GlobalId::product("632910392").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/Product/632910392");
        assert_eq!(id.resource_type(), "Product");
    }

    #[test]
    fn test_product_rejects_garbage() {
        assert!(matches!(
            GlobalId::product("abc"),
            Err(GlobalIdError::NotNumeric(_))
        ));
        assert!(GlobalId::product("-1").is_err());
        assert_eq!(
            GlobalId::product("gid://shopify/Order/1"),
            Err(GlobalIdError::WrongType {
                expected: "Product",
                actual: "Order".to_owned(),
            })
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let id: GlobalId = serde_json::from_str("\"gid://shopify/Shop/1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gid://shopify/Shop/1\"");
        assert!(serde_json::from_str::<GlobalId>("\"Shop/1\"").is_err());
    }
}
