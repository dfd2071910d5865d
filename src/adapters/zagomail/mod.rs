//! Zagomail email-marketing piece: subscribers, campaigns and webhook triggers.

pub mod actions;
pub mod client;
pub mod triggers;

pub use actions::list_options;
pub use client::ZagomailClient;

use crate::domain::{AuthCheck, Credentials};
use crate::ports::CredentialValidator;
use crate::usecases::{AuthKind, Piece};
use std::sync::Arc;
use triggers::{NEW_SUBSCRIBER_ADDED, SUBSCRIBER_TAGGED, SUBSCRIBER_UNSUBSCRIBED, ZagomailWebhookTrigger};

const AUTH_HELP: &str = "To obtain your Zagomail API keys: log in to Zagomail, go to Account > API, \
click Generate new keys and save the Public Key and Private Key.";

/// Probes the API with the connection's public key.
pub struct ZagomailAuthProbe;

#[async_trait::async_trait]
impl CredentialValidator for ZagomailAuthProbe {
    async fn validate(&self, auth: &Credentials) -> AuthCheck {
        match ZagomailClient::from_credentials(auth) {
            Ok(client) => client.test_auth().await,
            Err(e) => AuthCheck::invalid(e.to_string()),
        }
    }
}

pub fn piece() -> Piece {
    Piece {
        name: triggers::PIECE_NAME,
        display_name: "Zagomail",
        auth: AuthKind::CustomKeys {
            description: AUTH_HELP,
        },
        validator: Some(Arc::new(ZagomailAuthProbe)),
        actions: vec![
            Arc::new(actions::CreateSubscriber),
            Arc::new(actions::TagSubscriber),
            Arc::new(actions::UpdateSubscriber),
            Arc::new(actions::FindSubscriberByEmail),
            Arc::new(actions::GetSubscriberDetails),
            Arc::new(actions::GetCampaignStats),
        ],
        triggers: vec![
            Arc::new(ZagomailWebhookTrigger::new(&NEW_SUBSCRIBER_ADDED)),
            Arc::new(ZagomailWebhookTrigger::new(&SUBSCRIBER_UNSUBSCRIBED)),
            Arc::new(ZagomailWebhookTrigger::new(&SUBSCRIBER_TAGGED)),
        ],
    }
}
