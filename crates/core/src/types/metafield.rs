//! Metafield identities, value types and definition schemas.
//!
//! All metafields the app manages live under the `custom` namespace:
//!
//! | Owner   | Key                  | Type                     |
//! |---------|----------------------|--------------------------|
//! | Shop    | `spinning_selection` | `json`                   |
//! | Product | `spin_swipe_enable`  | `boolean`                |
//! | Product | `spin_swipe_text`    | `single_line_text_field` |

use core::fmt;

use serde::{Deserialize, Serialize};

/// A metafield's `(namespace, key)` address on its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetafieldIdentifier {
    /// Metafield namespace.
    pub namespace: &'static str,
    /// Metafield key, unique within the namespace.
    pub key: &'static str,
}

impl fmt::Display for MetafieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

/// Shop-level JSON document selecting the spinning tool.
pub const SPINNING_SELECTION: MetafieldIdentifier = MetafieldIdentifier {
    namespace: "custom",
    key: "spinning_selection",
};

/// Per-product toggle for spin swipe.
pub const SPIN_SWIPE_ENABLE: MetafieldIdentifier = MetafieldIdentifier {
    namespace: "custom",
    key: "spin_swipe_enable",
};

/// Per-product spin swipe caption.
pub const SPIN_SWIPE_TEXT: MetafieldIdentifier = MetafieldIdentifier {
    namespace: "custom",
    key: "spin_swipe_text",
};

/// Declared value type of a metafield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetafieldType {
    /// `"true"` or `"false"`.
    Boolean,
    /// A single line of text.
    SingleLineTextField,
    /// Any JSON document.
    Json,
}

impl MetafieldType {
    /// Returns the type name used by the Admin API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::SingleLineTextField => "single_line_text_field",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for MetafieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource type a metafield definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetafieldOwnerType {
    /// The shop itself.
    Shop,
    /// Products.
    Product,
}

/// Admin access level granted on a metafield definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAccess {
    /// Merchants can read and write values in the admin.
    MerchantReadWrite,
    /// Merchants can only read values.
    MerchantRead,
}

/// Schema for a metafield definition the app provisions on install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetafieldDefinitionSpec {
    /// Human-readable definition name.
    pub name: &'static str,
    /// Namespace and key.
    pub identifier: MetafieldIdentifier,
    /// Declared value type.
    pub value_type: MetafieldType,
    /// Owner resource type.
    pub owner_type: MetafieldOwnerType,
    /// Pin the definition in the admin resource page.
    pub pin: bool,
    /// Admin access level.
    pub access: AdminAccess,
}

/// Definitions created when the app is installed on a shop.
pub const SPIN_SWIPE_DEFINITIONS: [MetafieldDefinitionSpec; 2] = [
    MetafieldDefinitionSpec {
        name: "Spin Swipe Enabled",
        identifier: SPIN_SWIPE_ENABLE,
        value_type: MetafieldType::Boolean,
        owner_type: MetafieldOwnerType::Product,
        pin: true,
        access: AdminAccess::MerchantReadWrite,
    },
    MetafieldDefinitionSpec {
        name: "Spin Swipe Text",
        identifier: SPIN_SWIPE_TEXT,
        value_type: MetafieldType::SingleLineTextField,
        owner_type: MetafieldOwnerType::Product,
        pin: true,
        access: AdminAccess::MerchantReadWrite,
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        assert_eq!(SPINNING_SELECTION.to_string(), "custom.spinning_selection");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(MetafieldType::Boolean.as_str(), "boolean");
        assert_eq!(
            MetafieldType::SingleLineTextField.as_str(),
            "single_line_text_field"
        );
        assert_eq!(MetafieldType::Json.as_str(), "json");
    }

    #[test]
    fn test_type_serde_matches_api_names() {
        for ty in [
            MetafieldType::Boolean,
            MetafieldType::SingleLineTextField,
            MetafieldType::Json,
        ] {
            let encoded = serde_json::to_string(&ty).unwrap();
            assert_eq!(encoded, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&MetafieldOwnerType::Product).unwrap(),
            "\"PRODUCT\""
        );
        assert_eq!(
            serde_json::to_string(&AdminAccess::MerchantReadWrite).unwrap(),
            "\"MERCHANT_READ_WRITE\""
        );
    }

    #[test]
    fn test_install_definitions() {
        let [enable, text] = SPIN_SWIPE_DEFINITIONS;
        assert_eq!(enable.identifier, SPIN_SWIPE_ENABLE);
        assert_eq!(enable.value_type, MetafieldType::Boolean);
        assert_eq!(text.identifier, SPIN_SWIPE_TEXT);
        assert_eq!(text.value_type, MetafieldType::SingleLineTextField);
        assert!(
            SPIN_SWIPE_DEFINITIONS
                .iter()
                .all(|d| d.owner_type == MetafieldOwnerType::Product && d.pin)
        );
    }
}
