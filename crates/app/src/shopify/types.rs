//! Domain types returned by the Shopify client.

use serde::{Deserialize, Serialize};

/// A user error reported by a mutation.
///
/// User errors are part of a successful response (HTTP 200, no GraphQL
/// errors); they describe input the store refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserError {
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable error code, when the mutation reports one.
    #[serde(default)]
    pub code: Option<String>,
}

impl UserError {
    /// Whether this error reports that the target already exists.
    ///
    /// Definition creation reports a duplicate `(ownerType, namespace, key)`
    /// with code `TAKEN`; webhook subscription creation only says so in the
    /// message.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        if self.code.as_deref() == Some("TAKEN") {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("already exists")
            || message.contains("already been taken")
            || message.contains("already in use")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_error(message: &str, code: Option<&str>) -> UserError {
        UserError {
            field: None,
            message: message.to_string(),
            code: code.map(String::from),
        }
    }

    #[test]
    fn test_taken_code_is_already_exists() {
        assert!(user_error("Key is in use", Some("TAKEN")).is_already_exists());
    }

    #[test]
    fn test_message_is_already_exists() {
        assert!(user_error("Address for this topic has already been taken", None).is_already_exists());
        assert!(
            user_error("Key is already in use for Product metafields", None).is_already_exists()
        );
    }

    #[test]
    fn test_other_errors_are_not_already_exists() {
        assert!(!user_error("Type is invalid", Some("INVALID")).is_already_exists());
    }

    #[test]
    fn test_deserialize_without_code() {
        let err: UserError =
            serde_json::from_str(r#"{"field":["webhookSubscription","callbackUrl"],"message":"bad"}"#)
                .expect("valid user error");
        assert_eq!(
            err.field,
            Some(vec!["webhookSubscription".to_string(), "callbackUrl".to_string()])
        );
        assert_eq!(err.code, None);
    }
}
