//! Kommo webhook triggers.
//!
//! All four triggers share one shape: subscribe `destination` to a single
//! event key, then pull the event list out of whatever payload layout Kommo
//! delivers. They differ only in the `KommoEvent` descriptor.

use super::client::KommoClient;
use crate::adapters::http::ApiRequest;
use crate::domain::{
    DomainError, EventPath, WebhookRegistration, extract_events, retain_flagged,
};
use crate::ports::{Trigger, TriggerContext};
use crate::usecases::{WebhookLifecycle, WebhookRegistrar};
use serde_json::{Value, json};
use tracing::{info, warn};

pub const PIECE_NAME: &str = "kommo";

/// Static description of one Kommo webhook event.
pub struct KommoEvent {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Kommo `settings` key, e.g. `add_lead`.
    pub event_key: &'static str,
    pub path: EventPath,
    /// Keep only entries whose `is_completed` is exactly `true`.
    pub completed_only: bool,
    pub sample: fn() -> Value,
}

pub static NEW_LEAD_CREATED: KommoEvent = KommoEvent {
    name: "new_lead_created",
    display_name: "New Lead Created",
    description: "Fires when a new lead is created in Kommo.",
    event_key: "add_lead",
    path: EventPath {
        collection: "leads",
        sub_keys: &["add"],
    },
    completed_only: false,
    sample: || {
        json!({
            "leads": [{
                "id": 12345,
                "name": "New Lead via Webhook",
                "status_id": 78910,
                "pipeline_id": 11121,
                "created_at": 1678886400
            }]
        })
    },
};

pub static LEAD_STATUS_CHANGED: KommoEvent = KommoEvent {
    name: "lead_status_changed",
    display_name: "Lead Status Changed",
    description: "Fires when a lead changes its pipeline stage/status.",
    event_key: "status_lead",
    path: EventPath {
        collection: "leads",
        sub_keys: &["status"],
    },
    completed_only: false,
    sample: || {
        json!({
            "leads": [{
                "id": 54321,
                "status_id": "142",
                "old_status_id": "141",
                "pipeline_id": "1001",
                "updated_at": 1678886500
            }]
        })
    },
};

pub static NEW_CONTACT_ADDED: KommoEvent = KommoEvent {
    name: "new_contact_added",
    display_name: "New Contact Added",
    description: "Fires when a new contact is added to Kommo.",
    event_key: "add_contact",
    path: EventPath {
        collection: "contacts",
        sub_keys: &["add"],
    },
    completed_only: false,
    sample: || {
        json!({
            "contacts": [{
                "id": 67890,
                "name": "New Contact via Webhook",
                "first_name": "John",
                "last_name": "Doe",
                "created_at": 1678886600
            }]
        })
    },
};

pub static TASK_COMPLETED: KommoEvent = KommoEvent {
    name: "task_completed",
    display_name: "Task Completed",
    description: "Fires when a user marks a task as complete.",
    event_key: "update_task",
    path: EventPath {
        collection: "tasks",
        sub_keys: &["update", "status"],
    },
    completed_only: true,
    sample: || {
        json!({
            "tasks": [{
                "id": 78901,
                "text": "Follow up call with new lead",
                "is_completed": true,
                "responsible_user_id": 123,
                "entity_id": 12345,
                "entity_type": "leads",
                "complete_till": 1678886700,
                "updated_at": 1678886700,
                "created_at": 1678880000,
                "result": { "text": "Called and discussed next steps." }
            }]
        })
    },
};

/// Kommo side of the webhook lifecycle for one event key.
pub struct KommoRegistrar<'a> {
    client: &'a KommoClient,
    event_key: &'static str,
}

impl<'a> KommoRegistrar<'a> {
    pub fn new(client: &'a KommoClient, event_key: &'static str) -> Self {
        Self { client, event_key }
    }
}

/// Webhook id from a Kommo subscribe response; numeric ids are rendered as text.
pub fn webhook_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait::async_trait]
impl WebhookRegistrar for KommoRegistrar<'_> {
    async fn register(&self, destination: &str) -> Result<String, DomainError> {
        let request = ApiRequest::post("/api/v4/webhooks").json(json!({
            "destination": destination,
            "settings": [self.event_key],
        }));
        let body = self.client.execute(&request).await?;
        webhook_id(&body).ok_or_else(|| {
            DomainError::WebhookRegistration(format!(
                "Failed to create Kommo webhook for {}. Body: {}",
                self.event_key, body
            ))
        })
    }

    /// Kommo unsubscribes by destination URL, not by id.
    async fn unregister(&self, registration: &WebhookRegistration) -> Result<(), DomainError> {
        let request = ApiRequest::delete("/api/v4/webhooks")
            .json(json!({ "destination": registration.destination_url }));
        self.client.execute(&request).await.map(|_| ())
    }
}

pub struct KommoWebhookTrigger {
    event: &'static KommoEvent,
}

impl KommoWebhookTrigger {
    pub const fn new(event: &'static KommoEvent) -> Self {
        Self { event }
    }

    fn lifecycle(&self, ctx: &TriggerContext) -> WebhookLifecycle {
        WebhookLifecycle::new(PIECE_NAME, self.event.name, ctx.store.clone())
    }
}

#[async_trait::async_trait]
impl Trigger for KommoWebhookTrigger {
    fn name(&self) -> &'static str {
        self.event.name
    }

    fn display_name(&self) -> &'static str {
        self.event.display_name
    }

    fn description(&self) -> &'static str {
        self.event.description
    }

    fn sample_data(&self) -> Value {
        (self.event.sample)()
    }

    async fn on_enable(&self, ctx: &TriggerContext) -> Result<(), DomainError> {
        let client = KommoClient::from_credentials(&ctx.credentials)?;
        let registrar = KommoRegistrar::new(&client, self.event.event_key);
        self.lifecycle(ctx)
            .enable(&registrar, &ctx.webhook_url)
            .await
            .map(|_| ())
    }

    async fn on_disable(&self, ctx: &TriggerContext) -> Result<(), DomainError> {
        let lifecycle = self.lifecycle(ctx);
        match KommoClient::from_credentials(&ctx.credentials) {
            Ok(client) => {
                let registrar = KommoRegistrar::new(&client, self.event.event_key);
                lifecycle.disable(&registrar, &ctx.webhook_url).await
            }
            Err(e) => {
                warn!(trigger = self.event.name, error = %e, "cannot reach kommo; clearing webhook state only");
                lifecycle.clear().await
            }
        }
    }

    async fn run(&self, _ctx: &TriggerContext, payload: &Value) -> Result<Vec<Value>, DomainError> {
        let mut events = extract_events(payload, &self.event.path);
        if self.event.completed_only {
            events = retain_flagged(events, "is_completed");
        }
        if !events.is_empty() {
            info!(
                trigger = self.event.name,
                count = events.len(),
                "received kommo webhook events"
            );
        }
        Ok(events)
    }
}
