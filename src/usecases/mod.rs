//! Application use cases. Orchestrate domain logic via ports.

pub mod piece_registry;
pub mod webhook_lifecycle;

pub use piece_registry::{AuthKind, Piece, PieceRegistry};
pub use webhook_lifecycle::{KeyField, WebhookLifecycle, WebhookRegistrar, store_key};
