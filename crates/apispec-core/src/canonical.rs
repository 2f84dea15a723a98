//! Canonical JSON and content hashing.
//!
//! Component names must not depend on map iteration order or on the process
//! that produced them, so schemas are hashed over a canonical serialization:
//! object keys sorted recursively, no insignificant whitespace.

// External imports (alphabetized)
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use sha2::{Digest, Sha256};

/// Recursively sort object keys.
pub fn canonicalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            JsonValue::Object(sorted)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact canonical serialization of any serializable value.
pub fn to_canonical_string<T: Serialize>(value: &T) -> crate::Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize(&value))?)
}

/// Lowercase hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"b": 1, "a": {"y": [1, {"d": 0, "c": 0}], "x": null}});
        let b = json!({"a": {"x": null, "y": [1, {"c": 0, "d": 0}]}, "b": 1});
        assert_eq!(to_canonical_string(&a).unwrap(), to_canonical_string(&b).unwrap());
        assert_eq!(
            to_canonical_string(&a).unwrap(),
            r#"{"a":{"x":null,"y":[1,{"c":0,"d":0}]},"b":1}"#
        );
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash("{\"a\":1}"), content_hash("{\"a\":2}"));
    }
}
