//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the host flow engine into a piece
//! - Outbound: Called by a piece into infrastructure

pub mod inbound;
pub mod outbound;

pub use inbound::{Action, CredentialValidator, Trigger, TriggerContext};
pub use outbound::StorePort;
