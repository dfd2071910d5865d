//! Webhook payload normalization. Pure; no I/O.
//!
//! Vendors deliver the same event list in several envelope shapes. Shapes are
//! tried in a fixed order and the first structural match wins.

use serde_json::Value;

/// Where a trigger's events live in an inbound payload.
#[derive(Debug, Clone, Copy)]
pub struct EventPath {
    /// Top-level collection key, e.g. `leads`.
    pub collection: &'static str,
    /// Sub-keys under the collection holding the event array, tried in order.
    pub sub_keys: &'static [&'static str],
}

type ShapeMatcher = fn(&Value, &EventPath) -> Option<Vec<Value>>;

/// `{collection: {sub_key: [...]}}`
fn nested_collection(payload: &Value, path: &EventPath) -> Option<Vec<Value>> {
    let inner = payload.get(path.collection)?.as_object()?;
    path.sub_keys
        .iter()
        .find_map(|k| inner.get(*k).and_then(Value::as_array))
        .cloned()
}

/// `{collection: [...]}`
fn collection_array(payload: &Value, path: &EventPath) -> Option<Vec<Value>> {
    payload.get(path.collection)?.as_array().cloned()
}

/// `[...]` at the root.
fn root_array(payload: &Value, _path: &EventPath) -> Option<Vec<Value>> {
    payload.as_array().cloned()
}

const SHAPES: &[ShapeMatcher] = &[nested_collection, collection_array, root_array];

/// Locates the event array for `path`. Empty when no known shape matches.
pub fn extract_events(payload: &Value, path: &EventPath) -> Vec<Value> {
    SHAPES
        .iter()
        .find_map(|shape| shape(payload, path))
        .unwrap_or_default()
}

/// Keeps entries whose `field` is exactly `true`.
pub fn retain_flagged(events: Vec<Value>, field: &str) -> Vec<Value> {
    events
        .into_iter()
        .filter(|e| e.get(field).and_then(Value::as_bool) == Some(true))
        .collect()
}

/// Loose equality for correlation ids that may arrive as string or number.
pub fn same_id(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}
