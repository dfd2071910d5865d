//! Kommo CRM piece: leads, contacts, companies and webhook triggers.

pub mod client;
pub mod companies;
pub mod contacts;
pub mod leads;
pub mod triggers;

pub use client::KommoClient;
pub use contacts::contact_options;
pub use leads::lead_options;

use crate::usecases::{AuthKind, Piece};
use std::sync::Arc;
use triggers::{
    KommoWebhookTrigger, LEAD_STATUS_CHANGED, NEW_CONTACT_ADDED, NEW_LEAD_CREATED, TASK_COMPLETED,
};

pub fn piece() -> Piece {
    Piece {
        name: triggers::PIECE_NAME,
        display_name: "Kommo",
        auth: AuthKind::OAuth2 {
            auth_url: "https://www.kommo.com/oauth",
            token_url: "https://{subdomain}.kommo.com/oauth2/access_token",
        },
        validator: None,
        actions: vec![
            Arc::new(leads::CreateLead),
            Arc::new(leads::UpdateLead),
            Arc::new(contacts::CreateContact),
            Arc::new(contacts::UpdateContact),
            Arc::new(leads::FindLead),
            Arc::new(contacts::FindContactByEmail),
            Arc::new(companies::FindCompany),
        ],
        triggers: vec![
            Arc::new(KommoWebhookTrigger::new(&NEW_LEAD_CREATED)),
            Arc::new(KommoWebhookTrigger::new(&LEAD_STATUS_CHANGED)),
            Arc::new(KommoWebhookTrigger::new(&NEW_CONTACT_ADDED)),
            Arc::new(KommoWebhookTrigger::new(&TASK_COMPLETED)),
        ],
    }
}
