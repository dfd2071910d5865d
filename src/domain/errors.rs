//! Domain errors. Returned by ports, actions and triggers.
//!
//! Adapters map HTTP/IO failures into these; the host decides what to surface.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Credential-derived context is missing (e.g. Kommo account subdomain).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required input is missing or logically insufficient.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("{vendor} API error {status}: {body}")]
    Http {
        vendor: &'static str,
        status: u16,
        body: String,
    },

    /// Vendor reported a logical failure inside a transport-level success.
    #[error("{vendor} API Error: {message}")]
    Vendor {
        vendor: &'static str,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Webhook registration failed: {0}")]
    WebhookRegistration(String),

    #[error("Store error: {0}")]
    Store(String),

    /// Interactive prompt failed or was cancelled.
    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl DomainError {
    /// True when this is a vendor logical error whose message contains `needle`.
    ///
    /// Call sites use this to treat specific "does not exist" errors as a benign miss.
    pub fn vendor_message_contains(&self, needle: &str) -> bool {
        matches!(self, DomainError::Vendor { message, .. } if message.contains(needle))
    }
}
