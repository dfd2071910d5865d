//! Zagomail webhook triggers.

use super::client::ZagomailClient;
use crate::adapters::http::ApiRequest;
use crate::domain::{DomainError, WebhookRegistration, same_id};
use crate::ports::{Trigger, TriggerContext};
use crate::usecases::{WebhookLifecycle, WebhookRegistrar};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

pub const PIECE_NAME: &str = "zagomail";

/// What a matching delivery turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// `[payload.subscriber]`, nothing when the subscriber is absent.
    Subscriber,
    /// `[payload]`.
    Payload,
    /// `[payload]` when `payload.tag_id` equals the `tag_id` prop.
    TaggedPayload,
}

pub struct ZagomailEvent {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub event_type: &'static str,
    pub emit: Emit,
    pub sample: fn() -> Value,
}

pub static NEW_SUBSCRIBER_ADDED: ZagomailEvent = ZagomailEvent {
    name: "new_subscriber_added",
    display_name: "New Subscriber Added",
    description: "Triggers when a new subscriber is activated (signed up or confirmed).",
    event_type: "subscriber-activate",
    emit: Emit::Subscriber,
    sample: || {
        json!({
            "event_type": "subscriber-activate",
            "subscriber": {
                "subscriber_uid": "sub_123xyz",
                "email": "test@example.com",
                "fname": "Test",
                "lname": "User"
            },
            "timestamp": "2023-10-27T10:00:00Z"
        })
    },
};

pub static SUBSCRIBER_UNSUBSCRIBED: ZagomailEvent = ZagomailEvent {
    name: "subscriber_unsubscribed",
    display_name: "Subscriber Unsubscribed",
    description: "Triggers when a subscriber unsubscribes from a list.",
    event_type: "subscriber-unsubscribe",
    emit: Emit::Payload,
    sample: || {
        json!({
            "event_type": "subscriber-unsubscribe",
            "subscriber": {
                "subscriber_uid": "sub_123xyz",
                "email": "test@example.com"
            },
            "list_uid": "list_abc789",
            "timestamp": "2023-10-27T11:00:00Z"
        })
    },
};

pub static SUBSCRIBER_TAGGED: ZagomailEvent = ZagomailEvent {
    name: "subscriber_tagged",
    display_name: "Subscriber Tagged",
    description: "Triggers when a specific tag is added to a subscriber.",
    event_type: "tag-added",
    emit: Emit::TaggedPayload,
    sample: || {
        json!({
            "event_type": "tag-added",
            "subscriber": {
                "subscriber_uid": "sub_123xyz",
                "email": "test@example.com"
            },
            "tag_id": "tag_abc456",
            "list_uid": "list_def789",
            "timestamp": "2023-10-27T12:00:00Z"
        })
    },
};

/// Webhook id from `webhooks/create`: `data.webhook.id`, else top-level `webhook.id`.
pub fn webhook_id(body: &Value) -> Option<String> {
    let id = body
        .pointer("/data/webhook/id")
        .filter(|v| !v.is_null())
        .or_else(|| body.pointer("/webhook/id"))?;
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ZagomailRegistrar<'a> {
    client: &'a ZagomailClient,
    event_type: &'static str,
    tag_id: Option<String>,
}

impl<'a> ZagomailRegistrar<'a> {
    pub fn new(client: &'a ZagomailClient, event_type: &'static str, tag_id: Option<String>) -> Self {
        Self {
            client,
            event_type,
            tag_id,
        }
    }
}

#[async_trait::async_trait]
impl WebhookRegistrar for ZagomailRegistrar<'_> {
    async fn register(&self, destination: &str) -> Result<String, DomainError> {
        let mut body = Map::new();
        body.insert("event_type".into(), json!(self.event_type));
        body.insert("target_url".into(), json!(destination));
        if let Some(tag_id) = &self.tag_id {
            body.insert("tagID".into(), json!(tag_id));
        }

        let envelope = self
            .client
            .execute(&ApiRequest::post("webhooks/create").json(Value::Object(body)))
            .await?;
        webhook_id(&envelope.raw).ok_or_else(|| {
            DomainError::WebhookRegistration(format!(
                "Failed to create Zagomail webhook: the 'webhook' object or its 'id' was missing. Response: {}",
                envelope.raw
            ))
        })
    }

    async fn unregister(&self, registration: &WebhookRegistration) -> Result<(), DomainError> {
        let request = ApiRequest::post("webhooks/delete").query("id", &registration.webhook_id);
        self.client.execute(&request).await.map(|_| ())
    }
}

pub struct ZagomailWebhookTrigger {
    event: &'static ZagomailEvent,
}

impl ZagomailWebhookTrigger {
    pub const fn new(event: &'static ZagomailEvent) -> Self {
        Self { event }
    }

    /// Tag id for tag-scoped triggers; `None` for the others.
    fn tag_id(&self, ctx: &TriggerContext) -> Result<Option<String>, DomainError> {
        match self.event.emit {
            Emit::TaggedPayload => ctx.required_prop("tag_id").map(Some),
            _ => Ok(None),
        }
    }

    fn lifecycle(&self, ctx: &TriggerContext, tag_id: Option<&str>) -> WebhookLifecycle {
        let lifecycle = WebhookLifecycle::new(PIECE_NAME, self.event.name, ctx.store.clone());
        match tag_id {
            Some(tag) => lifecycle.with_correlation(tag),
            None => lifecycle,
        }
    }
}

#[async_trait::async_trait]
impl Trigger for ZagomailWebhookTrigger {
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
        let tag_id = self.tag_id(ctx)?;
        let client = ZagomailClient::from_credentials(&ctx.credentials)?;
        let registrar = ZagomailRegistrar::new(&client, self.event.event_type, tag_id.clone());
        self.lifecycle(ctx, tag_id.as_deref())
            .enable(&registrar, &ctx.webhook_url)
            .await
            .map(|_| ())
    }

    async fn on_disable(&self, ctx: &TriggerContext) -> Result<(), DomainError> {
        let tag_id = match self.tag_id(ctx) {
            Ok(tag_id) => tag_id,
            Err(e) => {
                // Keys are scoped by tag id; without it there is nothing to locate.
                warn!(trigger = self.event.name, error = %e, "no tag id on disable; skipping teardown");
                return Ok(());
            }
        };
        let lifecycle = self.lifecycle(ctx, tag_id.as_deref());
        match ZagomailClient::from_credentials(&ctx.credentials) {
            Ok(client) => {
                let registrar = ZagomailRegistrar::new(&client, self.event.event_type, tag_id);
                lifecycle.disable(&registrar, &ctx.webhook_url).await
            }
            Err(e) => {
                warn!(trigger = self.event.name, error = %e, "cannot reach zagomail; clearing webhook state only");
                lifecycle.clear().await
            }
        }
    }

    async fn run(&self, ctx: &TriggerContext, payload: &Value) -> Result<Vec<Value>, DomainError> {
        if payload.get("event_type").and_then(Value::as_str) != Some(self.event.event_type) {
            debug!(trigger = self.event.name, "ignoring delivery for another event type");
            return Ok(Vec::new());
        }

        let events = match self.event.emit {
            Emit::Subscriber => payload
                .get("subscriber")
                .filter(|s| !s.is_null())
                .cloned()
                .into_iter()
                .collect(),
            Emit::Payload => vec![payload.clone()],
            Emit::TaggedPayload => {
                let wanted = ctx.required_prop("tag_id")?;
                match payload.get("tag_id") {
                    Some(tag) if same_id(tag, &wanted) => vec![payload.clone()],
                    _ => Vec::new(),
                }
            }
        };
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{Credentials, ZagomailAuth};
    use crate::ports::StorePort;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(api_url: &str, store: Arc<MemoryStore>) -> TriggerContext {
        let auth = ZagomailAuth::new("pk", "sk").with_api_url(api_url);
        TriggerContext::new(Credentials::Zagomail(auth), "https://host/hook", store)
    }

    #[test]
    fn test_webhook_id_locations() {
        assert_eq!(
            webhook_id(&json!({ "data": { "webhook": { "id": 12 } } })),
            Some("12".to_string())
        );
        assert_eq!(
            webhook_id(&json!({ "status": "success", "webhook": { "id": "w-1" } })),
            Some("w-1".to_string())
        );
        assert_eq!(webhook_id(&json!({ "status": "success" })), None);
    }

    #[tokio::test]
    async fn test_enable_tagged_scopes_store_by_tag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/create"))
            .and(body_partial_json(json!({
                "publicKey": "pk",
                "event_type": "tag-added",
                "target_url": "https://host/hook",
                "tagID": "5"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": { "webhook": { "id": "w-5" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let ctx = context(&server.uri(), store.clone()).with_props(json!({ "tag_id": 5 }));
        ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED)
            .on_enable(&ctx)
            .await
            .unwrap();

        assert_eq!(
            store.get("zagomail/subscriber_tagged/5/webhook_id").await.unwrap(),
            Some("w-5".to_string())
        );
    }

    #[tokio::test]
    async fn test_enable_tagged_requires_tag_prop() {
        let store = Arc::new(MemoryStore::new());
        let err = ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED)
            .on_enable(&context("http://127.0.0.1:9", store))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_enable_top_level_webhook_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "webhook": { "id": 31 }
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        ZagomailWebhookTrigger::new(&NEW_SUBSCRIBER_ADDED)
            .on_enable(&context(&server.uri(), store.clone()))
            .await
            .unwrap();
        assert_eq!(
            store.get("zagomail/new_subscriber_added/webhook_id").await.unwrap(),
            Some("31".to_string())
        );
    }

    #[tokio::test]
    async fn test_enable_missing_id_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let err = ZagomailWebhookTrigger::new(&SUBSCRIBER_UNSUBSCRIBED)
            .on_enable(&context(&server.uri(), store.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WebhookRegistration(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_disable_deletes_by_id_and_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/delete"))
            .and(query_param("id", "w-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store
            .put("zagomail/subscriber_unsubscribed/webhook_id", "w-9")
            .await
            .unwrap();

        ZagomailWebhookTrigger::new(&SUBSCRIBER_UNSUBSCRIBED)
            .on_disable(&context(&server.uri(), store.clone()))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_disable_tagged_without_tag_prop_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/delete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store
            .put("zagomail/subscriber_tagged/5/webhook_id", "w-5")
            .await
            .unwrap();

        ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED)
            .on_disable(&context(&server.uri(), store.clone()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_disable_tagged_clears_only_its_tag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/delete"))
            .and(query_param("id", "w-5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store
            .put("zagomail/subscriber_tagged/5/webhook_id", "w-5")
            .await
            .unwrap();
        store
            .put("zagomail/subscriber_tagged/6/webhook_id", "w-6")
            .await
            .unwrap();

        let ctx = context(&server.uri(), store.clone()).with_props(json!({ "tag_id": "5" }));
        ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED)
            .on_disable(&ctx)
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("zagomail/subscriber_tagged/6/webhook_id").await.unwrap(),
            Some("w-6".to_string())
        );
    }

    #[tokio::test]
    async fn test_disable_vendor_error_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/delete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "error": "Webhook not found"
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store
            .put("zagomail/new_subscriber_added/webhook_id", "w-1")
            .await
            .unwrap();

        ZagomailWebhookTrigger::new(&NEW_SUBSCRIBER_ADDED)
            .on_disable(&context(&server.uri(), store.clone()))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_run_new_subscriber_emits_subscriber() {
        let ctx = context("http://127.0.0.1:9", Arc::new(MemoryStore::new()));
        let trigger = ZagomailWebhookTrigger::new(&NEW_SUBSCRIBER_ADDED);

        let events = trigger.run(&ctx, &trigger.sample_data()).await.unwrap();
        assert_eq!(events, vec![trigger.sample_data()["subscriber"].clone()]);

        let no_subscriber = json!({ "event_type": "subscriber-activate" });
        assert!(trigger.run(&ctx, &no_subscriber).await.unwrap().is_empty());

        let wrong = json!({ "event_type": "subscriber-unsubscribe", "subscriber": {} });
        assert!(trigger.run(&ctx, &wrong).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_unsubscribed_emits_payload() {
        let ctx = context("http://127.0.0.1:9", Arc::new(MemoryStore::new()));
        let trigger = ZagomailWebhookTrigger::new(&SUBSCRIBER_UNSUBSCRIBED);
        let payload = trigger.sample_data();
        assert_eq!(trigger.run(&ctx, &payload).await.unwrap(), vec![payload]);
    }

    #[tokio::test]
    async fn test_run_tagged_compares_ids_textually() {
        let ctx = context("http://127.0.0.1:9", Arc::new(MemoryStore::new()))
            .with_props(json!({ "tag_id": "12" }));
        let trigger = ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED);

        let numeric = json!({ "event_type": "tag-added", "tag_id": 12 });
        assert_eq!(trigger.run(&ctx, &numeric).await.unwrap(), vec![numeric.clone()]);

        let other = json!({ "event_type": "tag-added", "tag_id": "13" });
        assert!(trigger.run(&ctx, &other).await.unwrap().is_empty());

        let untagged = json!({ "event_type": "tag-added" });
        assert!(trigger.run(&ctx, &untagged).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_test_returns_sample() {
        let ctx = context("http://127.0.0.1:9", Arc::new(MemoryStore::new()));
        let trigger = ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED);
        assert_eq!(trigger.test(&ctx).await.unwrap(), vec![trigger.sample_data()]);
    }
}
