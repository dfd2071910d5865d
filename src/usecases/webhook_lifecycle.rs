//! Webhook trigger lifecycle: register → persist → correlate → unregister.
//!
//! Shared by every webhook trigger of both pieces. Vendor specifics live behind
//! `WebhookRegistrar`; this module owns the store keys and the teardown policy.

use crate::domain::{DomainError, WebhookRegistration};
use crate::ports::StorePort;
use std::sync::Arc;
use tracing::{info, warn};

/// Which half of the registration record a store key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    WebhookId,
    Destination,
}

impl KeyField {
    fn as_str(self) -> &'static str {
        match self {
            KeyField::WebhookId => "webhook_id",
            KeyField::Destination => "destination",
        }
    }
}

/// Store key for one field of a trigger's registration.
///
/// `correlation` separates parallel subscriptions of the same trigger
/// (e.g. one per watched tag).
pub fn store_key(piece: &str, trigger: &str, correlation: Option<&str>, field: KeyField) -> String {
    match correlation {
        Some(c) => format!("{}/{}/{}/{}", piece, trigger, c, field.as_str()),
        None => format!("{}/{}/{}", piece, trigger, field.as_str()),
    }
}

/// Vendor side of the lifecycle.
#[async_trait::async_trait]
pub trait WebhookRegistrar: Send + Sync {
    /// Creates the subscription and returns the vendor's webhook id.
    async fn register(&self, destination: &str) -> Result<String, DomainError>;

    async fn unregister(&self, registration: &WebhookRegistration) -> Result<(), DomainError>;
}

/// Lifecycle for one (piece, trigger, correlation) in one flow instance's store.
pub struct WebhookLifecycle {
    piece: &'static str,
    trigger: &'static str,
    correlation: Option<String>,
    store: Arc<dyn StorePort>,
}

impl WebhookLifecycle {
    pub fn new(piece: &'static str, trigger: &'static str, store: Arc<dyn StorePort>) -> Self {
        Self {
            piece,
            trigger,
            correlation: None,
            store,
        }
    }

    pub fn with_correlation(mut self, correlation: impl Into<String>) -> Self {
        self.correlation = Some(correlation.into());
        self
    }

    fn key(&self, field: KeyField) -> String {
        store_key(self.piece, self.trigger, self.correlation.as_deref(), field)
    }

    /// Disabled → Enabled. Nothing is persisted unless registration succeeds.
    pub async fn enable(
        &self,
        registrar: &dyn WebhookRegistrar,
        webhook_url: &str,
    ) -> Result<WebhookRegistration, DomainError> {
        let webhook_id = registrar.register(webhook_url).await?;

        let id_key = self.key(KeyField::WebhookId);
        self.store.put(&id_key, &webhook_id).await?;
        if let Err(e) = self
            .store
            .put(&self.key(KeyField::Destination), webhook_url)
            .await
        {
            if let Err(cleanup) = self.store.delete(&id_key).await {
                warn!(key = %id_key, error = %cleanup, "failed to roll back webhook id");
            }
            return Err(e);
        }

        info!(
            piece = self.piece,
            trigger = self.trigger,
            correlation = self.correlation.as_deref().unwrap_or("-"),
            webhook_id = %webhook_id,
            destination = %webhook_url,
            "webhook registered"
        );

        Ok(WebhookRegistration {
            webhook_id,
            destination_url: webhook_url.to_string(),
        })
    }

    /// Persisted registration, if any. A missing destination falls back to `fallback_url`.
    pub async fn registration(
        &self,
        fallback_url: &str,
    ) -> Result<Option<WebhookRegistration>, DomainError> {
        let Some(webhook_id) = self.store.get(&self.key(KeyField::WebhookId)).await? else {
            return Ok(None);
        };
        let destination_url = self
            .store
            .get(&self.key(KeyField::Destination))
            .await?
            .unwrap_or_else(|| fallback_url.to_string());
        Ok(Some(WebhookRegistration {
            webhook_id,
            destination_url,
        }))
    }

    /// Enabled → Disabled. Unregister failures are logged; keys are always cleared.
    pub async fn disable(
        &self,
        registrar: &dyn WebhookRegistrar,
        fallback_url: &str,
    ) -> Result<(), DomainError> {
        match self.registration(fallback_url).await? {
            Some(registration) => {
                if let Err(e) = registrar.unregister(&registration).await {
                    warn!(
                        piece = self.piece,
                        trigger = self.trigger,
                        webhook_id = %registration.webhook_id,
                        error = %e,
                        "failed to delete webhook; clearing local state anyway"
                    );
                } else {
                    info!(
                        piece = self.piece,
                        trigger = self.trigger,
                        webhook_id = %registration.webhook_id,
                        "webhook deleted"
                    );
                }
            }
            None => {
                info!(
                    piece = self.piece,
                    trigger = self.trigger,
                    "no webhook id in store, skipping delete"
                );
            }
        }

        self.clear().await
    }

    /// Drops both keys without contacting the vendor.
    pub async fn clear(&self) -> Result<(), DomainError> {
        self.store.delete(&self.key(KeyField::WebhookId)).await?;
        self.store.delete(&self.key(KeyField::Destination)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryStore;
    use std::sync::Mutex;

    /// Records calls; registers with a fixed outcome.
    struct FakeRegistrar {
        register_result: Result<String, String>,
        fail_unregister: bool,
        unregistered: Mutex<Vec<WebhookRegistration>>,
    }

    impl FakeRegistrar {
        fn ok(id: &str) -> Self {
            Self {
                register_result: Ok(id.to_string()),
                fail_unregister: false,
                unregistered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl WebhookRegistrar for FakeRegistrar {
        async fn register(&self, _destination: &str) -> Result<String, DomainError> {
            self.register_result
                .clone()
                .map_err(DomainError::WebhookRegistration)
        }

        async fn unregister(&self, registration: &WebhookRegistration) -> Result<(), DomainError> {
            self.unregistered.lock().unwrap().push(registration.clone());
            if self.fail_unregister {
                return Err(DomainError::Transport("connection reset".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_store_key_scopes_by_correlation() {
        assert_eq!(
            store_key("kommo", "new_lead_created", None, KeyField::WebhookId),
            "kommo/new_lead_created/webhook_id"
        );
        assert_eq!(
            store_key("zagomail", "subscriber_tagged", Some("12"), KeyField::Destination),
            "zagomail/subscriber_tagged/12/destination"
        );
        assert_ne!(
            store_key("zagomail", "subscriber_tagged", Some("12"), KeyField::WebhookId),
            store_key("zagomail", "subscriber_tagged", Some("13"), KeyField::WebhookId)
        );
    }

    #[tokio::test]
    async fn test_enable_persists_id_and_destination() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WebhookLifecycle::new("kommo", "new_lead_created", store.clone());
        let registrar = FakeRegistrar::ok("wh-1");

        let reg = lifecycle
            .enable(&registrar, "https://host/hook")
            .await
            .unwrap();
        assert_eq!(reg.webhook_id, "wh-1");
        assert_eq!(
            store.get("kommo/new_lead_created/webhook_id").await.unwrap(),
            Some("wh-1".to_string())
        );
        assert_eq!(
            store.get("kommo/new_lead_created/destination").await.unwrap(),
            Some("https://host/hook".to_string())
        );
    }

    #[tokio::test]
    async fn test_enable_failure_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WebhookLifecycle::new("kommo", "new_lead_created", store.clone());
        let registrar = FakeRegistrar {
            register_result: Err("no id".into()),
            fail_unregister: false,
            unregistered: Mutex::new(Vec::new()),
        };

        let err = lifecycle.enable(&registrar, "https://host/hook").await;
        assert!(matches!(err, Err(DomainError::WebhookRegistration(_))));
        assert!(store.is_empty().await);
    }

    /// Fails every write to a destination key.
    struct DestinationWriteFails(MemoryStore);

    #[async_trait::async_trait]
    impl StorePort for DestinationWriteFails {
        async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.0.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> Result<(), DomainError> {
            if key.ends_with("destination") {
                return Err(DomainError::Store("disk full".into()));
            }
            self.0.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), DomainError> {
            self.0.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_enable_rolls_back_id_when_destination_write_fails() {
        let store = Arc::new(DestinationWriteFails(MemoryStore::new()));
        let lifecycle = WebhookLifecycle::new("kommo", "new_lead_created", store.clone());

        let err = lifecycle
            .enable(&FakeRegistrar::ok("wh-2"), "https://host/hook")
            .await;
        assert!(matches!(err, Err(DomainError::Store(_))));
        assert!(store.0.is_empty().await);
    }

    #[tokio::test]
    async fn test_disable_without_id_skips_delete() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WebhookLifecycle::new("kommo", "task_completed", store.clone());
        let registrar = FakeRegistrar::ok("unused");

        lifecycle.disable(&registrar, "https://host/hook").await.unwrap();
        assert!(registrar.unregistered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disable_clears_keys_even_when_unregister_fails() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WebhookLifecycle::new("zagomail", "subscriber_tagged", store.clone())
            .with_correlation("5");
        let registrar = FakeRegistrar {
            register_result: Ok("99".into()),
            fail_unregister: true,
            unregistered: Mutex::new(Vec::new()),
        };

        lifecycle.enable(&registrar, "https://host/a").await.unwrap();
        assert_eq!(store.len().await, 2);

        lifecycle.disable(&registrar, "https://host/b").await.unwrap();
        let calls = registrar.unregistered.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![WebhookRegistration {
                webhook_id: "99".into(),
                destination_url: "https://host/a".into(),
            }]
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_registration_falls_back_to_current_url() {
        let store = Arc::new(MemoryStore::new());
        store
            .put("kommo/new_lead_created/webhook_id", "3")
            .await
            .unwrap();
        let lifecycle = WebhookLifecycle::new("kommo", "new_lead_created", store);

        let reg = lifecycle.registration("https://host/now").await.unwrap().unwrap();
        assert_eq!(reg.destination_url, "https://host/now");
    }
}
