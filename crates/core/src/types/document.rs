//! Fail-soft JSON document parsing.

use serde_json::Value;

/// Parse stored or fetched text as JSON, treating anything unparseable as
/// absent.
///
/// Empty and whitespace-only input is absent too. Read paths use this so a
/// corrupted or partially written value degrades to "not set" instead of an
/// error.
///
/// ```
/// use serde_json::json;
/// use spin_swipe_core::parse_or_none;
///
/// assert_eq!(parse_or_none(r#"{"a":1}"#), Some(json!({"a": 1})));
/// assert_eq!(parse_or_none("not-json"), None);
/// assert_eq!(parse_or_none(""), None);
/// ```
#[must_use]
pub fn parse_or_none(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_objects_and_arrays() {
        assert_eq!(
            parse_or_none(r#"{"tools":["wheel","slots"],"active":true}"#),
            Some(json!({"tools": ["wheel", "slots"], "active": true}))
        );
        assert_eq!(parse_or_none("[1,2,3]"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_primitives_parse() {
        assert_eq!(parse_or_none("null"), Some(Value::Null));
        assert_eq!(parse_or_none("42"), Some(json!(42)));
        assert_eq!(parse_or_none("\"text\""), Some(json!("text")));
    }

    #[test]
    fn test_malformed_is_none() {
        assert_eq!(parse_or_none("not-json"), None);
        assert_eq!(parse_or_none("{\"a\":"), None);
        assert_eq!(parse_or_none("<html></html>"), None);
        assert_eq!(parse_or_none("{} trailing"), None);
    }

    #[test]
    fn test_blank_is_none() {
        assert_eq!(parse_or_none(""), None);
        assert_eq!(parse_or_none("  \n"), None);
    }

    #[test]
    fn test_stringify_round_trip() {
        let values = [
            Value::Null,
            json!(true),
            json!(-3.5),
            json!("spin"),
            json!([]),
            json!({}),
            json!({"nested": {"list": [1, "two", null, {"three": 3}]}}),
            json!("unicode \u{1F3B0} and \"quotes\""),
        ];

        for value in values {
            assert_eq!(parse_or_none(&value.to_string()), Some(value));
        }
    }
}
