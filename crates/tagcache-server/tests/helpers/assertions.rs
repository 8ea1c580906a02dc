//! Custom assertions for tests.

use serde_json::Value;

/// Checks the shape of an invalidation response.
pub fn assert_invalidation(json: &Value, mode: &str, applied: bool) {
    assert!(json.is_object(), "Response should be a JSON object");
    assert_eq!(json["mode"], mode, "unexpected mode in {}", json);
    assert_eq!(json["applied"], applied, "unexpected applied in {}", json);
}

/// Returns the version a tag was bumped to in an invalidation response.
pub fn bumped_version(json: &Value, tag: &str) -> u64 {
    json["tags"]
        .as_array()
        .expect("'tags' should be an array")
        .iter()
        .find(|t| t["tag"] == tag)
        .and_then(|t| t["version"].as_u64())
        .unwrap_or_else(|| panic!("tag '{}' missing from {}", tag, json))
}

/// Checks the shape of a standard error body.
pub fn assert_error_body(json: &Value) {
    assert!(json["error"].is_string(), "'error' should be a string");
    assert!(json["message"].is_string(), "'message' should be a string");
}
