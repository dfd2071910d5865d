//! Piece registry: the host-facing dispatch surface.
//!
//! - Looks pieces, actions and triggers up by machine name
//! - Runs actions with one log line per dispatch
//! - Validates credentials through the piece's probe, if it has one

use crate::domain::{AuthCheck, Credentials, DomainError};
use crate::ports::{Action, CredentialValidator, Trigger};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// How a piece authenticates. Token acquisition is the host's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthKind {
    /// Authorization-code OAuth2. `{subdomain}` in `token_url` is filled per connection.
    OAuth2 {
        auth_url: &'static str,
        token_url: &'static str,
    },
    /// Static API keys entered by the user.
    CustomKeys { description: &'static str },
}

/// One connector: metadata plus its actions and triggers.
pub struct Piece {
    pub name: &'static str,
    pub display_name: &'static str,
    pub auth: AuthKind,
    pub validator: Option<Arc<dyn CredentialValidator>>,
    pub actions: Vec<Arc<dyn Action>>,
    pub triggers: Vec<Arc<dyn Trigger>>,
}

impl Piece {
    pub fn action(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.iter().find(|a| a.name() == name).cloned()
    }

    pub fn trigger(&self, name: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers.iter().find(|t| t.name() == name).cloned()
    }
}

#[derive(Default)]
pub struct PieceRegistry {
    pieces: Vec<Piece>,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a piece. A later piece with the same name replaces the earlier one.
    pub fn register(&mut self, piece: Piece) {
        self.pieces.retain(|p| p.name != piece.name);
        self.pieces.push(piece);
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, name: &str) -> Result<&Piece, DomainError> {
        self.pieces
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DomainError::Validation(format!("Unknown piece '{}'", name)))
    }

    pub fn action(&self, piece: &str, action: &str) -> Result<Arc<dyn Action>, DomainError> {
        self.piece(piece)?.action(action).ok_or_else(|| {
            DomainError::Validation(format!("Piece '{}' has no action '{}'", piece, action))
        })
    }

    pub fn trigger(&self, piece: &str, trigger: &str) -> Result<Arc<dyn Trigger>, DomainError> {
        self.piece(piece)?.trigger(trigger).ok_or_else(|| {
            DomainError::Validation(format!("Piece '{}' has no trigger '{}'", piece, trigger))
        })
    }

    pub async fn run_action(
        &self,
        piece: &str,
        action: &str,
        auth: &Credentials,
        props: Value,
    ) -> Result<Value, DomainError> {
        let handler = self.action(piece, action)?;
        info!(piece, action, "running action");

        match handler.run(auth, props).await {
            Ok(out) => Ok(out),
            Err(e) => {
                warn!(piece, action, error = %e, "action failed");
                Err(e)
            }
        }
    }

    /// Pieces without a probe accept any credentials of their kind.
    pub async fn validate_credentials(
        &self,
        piece: &str,
        auth: &Credentials,
    ) -> Result<AuthCheck, DomainError> {
        let piece = self.piece(piece)?;
        let check = match &piece.validator {
            Some(validator) => validator.validate(auth).await,
            None => AuthCheck::valid(),
        };
        info!(piece = piece.name, valid = check.valid, "credentials checked");
        Ok(check)
    }
}
