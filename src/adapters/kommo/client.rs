//! Kommo REST client. Bearer auth against `https://{subdomain}.kommo.com/api/v4`.

use crate::adapters::http::{ApiRequest, join_url, read_json};
use crate::domain::{Credentials, DomainError, KommoAuth};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub(crate) const VENDOR: &str = "Kommo";

/// Thin Kommo API client bound to one account.
pub struct KommoClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl KommoClient {
    /// Fails with a configuration error when the connection has no subdomain.
    pub fn from_auth(auth: &KommoAuth) -> Result<Self, DomainError> {
        let subdomain = auth.subdomain()?;
        let base_url = auth
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.kommo.com", subdomain));
        Ok(Self {
            client: Client::new(),
            base_url,
            access_token: auth.access_token.clone(),
        })
    }

    pub fn from_credentials(credentials: &Credentials) -> Result<Self, DomainError> {
        Self::from_auth(credentials.kommo()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and returns the parsed body (`null` for 204/empty).
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, DomainError> {
        let url = join_url(&self.base_url, &request.path);
        debug!(method = %request.method, url = %url, "kommo request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(&self.access_token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("Kommo request failed: {}", e)))?;
        read_json(VENDOR, response).await
    }
}

/// Inner array at `_embedded.{collection}`; empty when the envelope is absent.
pub fn embedded_list(body: &Value, collection: &str) -> Vec<Value> {
    body.get("_embedded")
        .and_then(|e| e.get(collection))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
