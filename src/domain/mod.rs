//! Core domain layer. No network or storage I/O.
//!
//! Credentials, entities, errors and payload normalization live here.

pub mod credentials;
pub mod entities;
pub mod errors;
pub mod payload;

pub use credentials::{Credentials, KommoAuth, ZagomailAuth};
pub use entities::{
    AuthCheck, DropdownOption, DropdownState, KommoContact, KommoLead, MailList, NotFound, TagRef,
    WebhookRegistration, embedded_tags,
};
pub use errors::DomainError;
pub use payload::{EventPath, extract_events, retain_flagged, same_id};
