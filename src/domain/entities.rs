//! Domain entities. Pure data structures shared by both pieces.
//!
//! Vendor resources are kept as JSON values; only the shapes this crate
//! builds or inspects are typed here.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Tag reference as entered by the user: by numeric id, by name, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TagRef {
    /// Element for the vendor's `_embedded` tag arrays. Id wins over name;
    /// `None` when neither is usable.
    pub fn to_embedded(&self) -> Option<Value> {
        if let Some(id) = self.id {
            return Some(json!({ "id": id }));
        }
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Some(json!({ "name": name })),
            _ => None,
        }
    }
}

/// Normalizes a tag list, dropping unusable entries.
pub fn embedded_tags(tags: &[TagRef]) -> Vec<Value> {
    tags.iter().filter_map(TagRef::to_embedded).collect()
}

/// The only record whose lifecycle this crate owns: one per (trigger, flow instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub webhook_id: String,
    pub destination_url: String,
}

/// Structured "not found" result returned by lookups instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFound {
    pub message: String,
    pub found: bool,
}

impl NotFound {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            found: false,
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "found": false }))
    }
}

/// One entry of a dynamic property picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: Value,
}

/// Options for a dynamic property picker, or a disabled state with a hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownState {
    pub disabled: bool,
    pub options: Vec<DropdownOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl DropdownState {
    pub fn ready(options: Vec<DropdownOption>) -> Self {
        Self {
            disabled: false,
            options,
            placeholder: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            disabled: true,
            options: Vec::new(),
            placeholder: Some(message.into()),
        }
    }
}

/// Kommo lead as listed for pickers.
#[derive(Debug, Clone, Deserialize)]
pub struct KommoLead {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl KommoLead {
    pub fn label(&self) -> String {
        match self.name.as_deref() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Lead ID: {}", self.id),
        }
    }
}

/// Kommo contact as listed for pickers.
#[derive(Debug, Clone, Deserialize)]
pub struct KommoContact {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl KommoContact {
    pub fn label(&self) -> String {
        if let Some(n) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return n.to_string();
        }
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if full.is_empty() {
            format!("Contact ID: {}", self.id)
        } else {
            full.to_string()
        }
    }
}

/// Zagomail mailing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailList {
    pub uid: String,
    pub name: String,
}

/// Outcome of a credential probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthCheck {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}
