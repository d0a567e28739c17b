//! Cache Key Derivation
//!
//! Builds deterministic cache keys from a namespace and an optional
//! parameter mapping.

use serde_json::Value;

/// Derives a cache key from a namespace and parameter pairs.
///
/// Parameters are sorted by name, so set-equal mappings produce an
/// identical key regardless of the order they were supplied in. Values are
/// JSON-encoded; string values drop their surrounding quotes so that
/// `category=drinks` reads naturally.
///
/// `derive_key("menu_items", &[("category", json!("drinks"))])` yields
/// `menu_items?category=drinks`; an empty parameter list yields the bare
/// namespace.
pub fn derive_key(namespace: &str, params: &[(&str, Value)]) -> String {
    if params.is_empty() {
        return namespace.to_string();
    }

    let mut pairs: Vec<(&str, String)> = params
        .iter()
        .map(|(name, value)| (*name, encode_value(value)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let query: Vec<String> = pairs
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();

    format!("{}?{}", namespace, query.join("&"))
}

/// Stable textual form of a parameter value.
///
/// serde_json's default map is ordered, so nested objects encode
/// deterministically.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
