//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters (persistence) or supplied by the host platform.

use crate::domain::DomainError;

/// Host-scoped persistent key-value store (one namespace per flow instance).
///
/// Triggers use it to remember the webhook they registered between
/// `on_enable` and `on_disable`.
#[async_trait::async_trait]
pub trait StorePort: Send + Sync {
    /// Returns `None` when the key was never written or has been deleted.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}
