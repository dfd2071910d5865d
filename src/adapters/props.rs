//! Helpers for turning host-validated props into typed inputs and request bodies.

use crate::domain::DomainError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Deserializes action props; shape mismatches are validation errors.
pub fn parse_props<T: DeserializeOwned>(props: Value) -> Result<T, DomainError> {
    let props = if props.is_null() {
        Value::Object(Map::new())
    } else {
        props
    };
    serde_json::from_value(props).map_err(|e| DomainError::Validation(format!("Invalid input: {}", e)))
}

/// Trimmed, non-empty text or `None`.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Required text field.
pub fn require_text<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, DomainError> {
    non_empty(value).ok_or_else(|| DomainError::Validation(message.to_string()))
}

/// Numeric entity id given as a number or numeric string (dropdowns allow custom mapped values).
pub fn require_id(value: &Option<Value>, message: &str) -> Result<i64, DomainError> {
    let id = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(DomainError::Validation(message.to_string())),
    }
}

/// Required identifier given as text or a number; rendered as text.
pub fn require_scalar(value: &Option<Value>, message: &str) -> Result<String, DomainError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(DomainError::Validation(message.to_string())),
    }
}

/// Inserts `key` only when `value` is present. Never writes explicit nulls.
pub fn insert_some<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        if let Ok(v) = serde_json::to_value(v) {
            if !v.is_null() {
                map.insert(key.to_string(), v);
            }
        }
    }
}

/// Inserts a JSON array only when it is a non-empty array.
pub fn insert_non_empty_array(map: &mut Map<String, Value>, key: &str, value: &Option<Value>) {
    if let Some(Value::Array(items)) = value {
        if !items.is_empty() {
            map.insert(key.to_string(), Value::Array(items.clone()));
        }
    }
}

/// Comma-joins selected related-entity names, rejecting values outside `allowed`.
pub fn join_with(selected: &Option<Vec<String>>, allowed: &[&str]) -> Result<Option<String>, DomainError> {
    let Some(selected) = selected.as_ref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Some(bad) = selected.iter().find(|s| !allowed.contains(&s.as_str())) {
        return Err(DomainError::Validation(format!(
            "Unsupported 'with' value '{}'; expected one of: {}",
            bad,
            allowed.join(", ")
        )));
    }
    Ok(Some(selected.join(",")))
}
