//! Shared HTTP plumbing for the vendor clients.
//!
//! Actions describe their single outbound call as an `ApiRequest` (pure, testable);
//! each vendor client turns it into a reqwest call with its own auth and envelope rules.

use crate::domain::DomainError;
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::warn;

/// Max characters of an error body kept in `DomainError::Http`.
const ERROR_BODY_PREVIEW: usize = 200;

/// One outbound request: method, path relative to the vendor base URL, query, JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<String>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Joins a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reads a response as JSON. Non-2xx becomes `Http`; an empty body becomes `null`.
pub async fn read_json(vendor: &'static str, response: Response) -> Result<Value, DomainError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| DomainError::Transport(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        warn!(vendor, status = %status, body = %preview(&text), "API returned error status");
        return Err(DomainError::Http {
            vendor,
            status: status.as_u16(),
            body: preview(&text),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| {
        DomainError::UnexpectedResponse(format!("{} returned invalid JSON: {}", vendor, e))
    })
}

fn preview(text: &str) -> String {
    text.chars().take(ERROR_BODY_PREVIEW).collect()
}
