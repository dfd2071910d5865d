//! Zagomail REST client.
//!
//! Zagomail answers HTTP 200 for logical failures and reports the outcome in a
//! `status` field (`"success"` / `"error"`). `classify` turns that envelope into
//! a `Result`, so callers see vendor errors as `DomainError::Vendor`.

use crate::adapters::http::{ApiRequest, join_url, read_json};
use crate::domain::{AuthCheck, Credentials, DomainError, MailList, ZagomailAuth};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub(crate) const VENDOR: &str = "Zagomail";

pub const DEFAULT_API_URL: &str = "https://api.zagomail.com";

const STATUS_FALLBACK: &str = "Operation failed with status: error";

/// Vendor errors that mean "authenticated, but the probe subscriber is absent".
const BENIGN_PROBE_ERRORS: &[&str] = &["The subscriber does not exist in this list", "subscriber not found"];

const PROBE_LIST_UID: &str = "ap-test-list-uid";
const PROBE_SUBSCRIBER_UID: &str = "ap-test-subscriber-uid";

/// A `status: "success"` response.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub data: Option<Value>,
    pub message: Option<String>,
    /// Full body; some endpoints put results outside `data`.
    pub raw: Value,
}

impl Envelope {
    /// `data.record`, the single-subscriber payload most list endpoints return.
    pub fn record(&self) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|d| d.get("record"))
            .filter(|r| !r.is_null())
    }
}

/// Classifies a Zagomail response body.
pub fn classify(body: Value) -> Result<Envelope, DomainError> {
    match body.get("status").and_then(Value::as_str) {
        Some("success") => Ok(Envelope {
            data: body.get("data").filter(|d| !d.is_null()).cloned(),
            message: body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            raw: body,
        }),
        Some("error") => Err(DomainError::Vendor {
            vendor: VENDOR,
            message: error_message(&body),
        }),
        _ => Err(DomainError::UnexpectedResponse(
            "Zagomail API Error: Unexpected response structure or missing status.".to_string(),
        )),
    }
}

fn error_message(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
        Some(obj @ Value::Object(_)) => return obj.to_string(),
        _ => {}
    }
    match body.get("message").and_then(Value::as_str) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => STATUS_FALLBACK.to_string(),
    }
}

pub struct ZagomailClient {
    client: Client,
    api_url: String,
    public_key: String,
}

impl ZagomailClient {
    pub fn from_auth(auth: &ZagomailAuth) -> Self {
        let api_url = auth
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            client: Client::new(),
            api_url,
            public_key: auth.public_key.clone(),
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Result<Self, DomainError> {
        Ok(Self::from_auth(credentials.zagomail()?))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Request body with `publicKey` merged in. Non-object bodies are replaced.
    fn body_with_key(&self, body: Option<&Value>) -> Value {
        let mut map = match body {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };
        map.insert("publicKey".to_string(), Value::String(self.public_key.clone()));
        Value::Object(map)
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<Envelope, DomainError> {
        let url = join_url(&self.api_url, &request.path);
        debug!(method = %request.method, url = %url, "zagomail request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json")
            .json(&self.body_with_key(request.body.as_ref()));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("Zagomail API Request Failed: {}", e)))?;
        classify(read_json(VENDOR, response).await?)
    }

    /// Probes a fixed non-existent subscriber. A "not found" answer proves the key works.
    pub async fn test_auth(&self) -> AuthCheck {
        let request = ApiRequest::get("lists/get-subscriber")
            .query("list_uid", PROBE_LIST_UID)
            .query("subscriber_uid", PROBE_SUBSCRIBER_UID);

        match self.execute(&request).await {
            Ok(_) => AuthCheck::valid(),
            Err(e) if BENIGN_PROBE_ERRORS.iter().any(|n| e.vendor_message_contains(n)) => {
                AuthCheck::valid()
            }
            Err(e) => {
                warn!(error = %e, "zagomail credential probe failed");
                AuthCheck::invalid(format!("Authentication test failed: {}", e))
            }
        }
    }

    pub async fn all_lists(&self) -> Result<Vec<MailList>, DomainError> {
        let envelope = self.execute(&ApiRequest::get("lists/all-lists")).await?;
        let lists = parse_lists(envelope.data.as_ref());
        info!(count = lists.len(), "loaded zagomail lists");
        Ok(lists)
    }
}

/// `data.records[]`; each entry is `{general: {list_uid, name}}` or flat `{list_uid|uid, name}`.
pub fn parse_lists(data: Option<&Value>) -> Vec<MailList> {
    let Some(records) = data.and_then(|d| d.get("records")).and_then(Value::as_array) else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| {
            let fields = record.get("general").unwrap_or(record);
            let uid = fields
                .get("list_uid")
                .or_else(|| fields.get("uid"))
                .and_then(Value::as_str)?;
            let name = fields.get("name").and_then(Value::as_str).unwrap_or(uid);
            Some(MailList {
                uid: uid.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
