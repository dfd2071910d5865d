//! Inbound ports. The host flow engine calls into pieces through these.

use crate::domain::{AuthCheck, Credentials, DomainError};
use crate::ports::StorePort;
use serde_json::Value;
use std::sync::Arc;

/// A synchronous request/response step: validated props in, JSON out.
#[async_trait::async_trait]
pub trait Action: Send + Sync {
    /// Stable machine name (e.g. `create_new_lead`).
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Builds one request from `props`, sends it and returns the unwrapped result.
    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError>;
}

/// Everything a trigger callback gets from the host.
#[derive(Clone)]
pub struct TriggerContext {
    pub credentials: Credentials,
    /// Callback URL the host provisioned for this flow instance.
    pub webhook_url: String,
    /// Trigger props (e.g. the tag id a tag trigger listens for).
    pub props: Value,
    pub store: Arc<dyn StorePort>,
}

impl TriggerContext {
    pub fn new(credentials: Credentials, webhook_url: impl Into<String>, store: Arc<dyn StorePort>) -> Self {
        Self {
            credentials,
            webhook_url: webhook_url.into(),
            props: Value::Null,
            store,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Required string prop; numbers are accepted and rendered as text.
    pub fn required_prop(&self, key: &str) -> Result<String, DomainError> {
        match self.props.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(DomainError::Validation(format!("Property '{}' is required", key))),
        }
    }
}

/// A webhook-backed event source: enable, normalize deliveries, disable.
#[async_trait::async_trait]
pub trait Trigger: Send + Sync {
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Representative event used for flow design and `test`.
    fn sample_data(&self) -> Value;

    /// Registers the webhook and persists its identity. Errors abort activation.
    async fn on_enable(&self, ctx: &TriggerContext) -> Result<(), DomainError>;

    /// Best-effort unregister, then clears persisted state.
    async fn on_disable(&self, ctx: &TriggerContext) -> Result<(), DomainError>;

    /// Normalizes one inbound delivery into the events the flow consumes.
    async fn run(&self, ctx: &TriggerContext, payload: &Value) -> Result<Vec<Value>, DomainError>;

    async fn test(&self, _ctx: &TriggerContext) -> Result<Vec<Value>, DomainError> {
        Ok(vec![self.sample_data()])
    }
}

/// Connection-time credential check offered by pieces with custom auth.
#[async_trait::async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, auth: &Credentials) -> AuthCheck;
}
