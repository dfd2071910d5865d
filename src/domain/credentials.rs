//! Resolved connection credentials, one shape per piece.
//!
//! The host resolves and stores these; actions only read the fields they need.

use crate::domain::DomainError;
use serde::Deserialize;
use std::fmt;

/// Credential config handed to actions and triggers.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// OAuth2 connection with account-specific sub-properties.
    Kommo(KommoAuth),
    /// Public/private API key pair.
    Zagomail(ZagomailAuth),
}

impl Credentials {
    pub fn kommo(&self) -> Result<&KommoAuth, DomainError> {
        match self {
            Credentials::Kommo(auth) => Ok(auth),
            _ => Err(DomainError::Config(
                "Expected a Kommo OAuth2 connection".to_string(),
            )),
        }
    }

    pub fn zagomail(&self) -> Result<&ZagomailAuth, DomainError> {
        match self {
            Credentials::Zagomail(auth) => Ok(auth),
            _ => Err(DomainError::Config(
                "Expected a Zagomail API key connection".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Kommo(a) => f.debug_tuple("Kommo").field(a).finish(),
            Credentials::Zagomail(a) => f.debug_tuple("Zagomail").field(a).finish(),
        }
    }
}

/// Kommo OAuth2 connection. Token refresh is the host's job.
#[derive(Clone, Deserialize)]
pub struct KommoAuth {
    pub access_token: String,
    #[serde(default)]
    pub account_subdomain: Option<String>,
    /// Overrides `https://{subdomain}.kommo.com` (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl KommoAuth {
    pub fn new(access_token: impl Into<String>, account_subdomain: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_subdomain,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Account subdomain (`yourcompany` for `yourcompany.kommo.com`).
    pub fn subdomain(&self) -> Result<&str, DomainError> {
        match self.account_subdomain.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(DomainError::Config(
                "Account subdomain is missing from connection. Please reconfigure the connection."
                    .to_string(),
            )),
        }
    }
}

impl fmt::Debug for KommoAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KommoAuth")
            .field("access_token", &"<redacted>")
            .field("account_subdomain", &self.account_subdomain)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Zagomail key pair. Only the public key is sent on data operations.
#[derive(Clone, Deserialize)]
pub struct ZagomailAuth {
    #[serde(rename = "publicKey", alias = "public_key")]
    pub public_key: String,
    #[serde(rename = "privateKey", alias = "private_key", default)]
    pub private_key: String,
    /// Overrides the API base URL (proxies, tests).
    #[serde(rename = "apiUrl", alias = "api_url", default)]
    pub api_url: Option<String>,
}

impl ZagomailAuth {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

impl fmt::Debug for ZagomailAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZagomailAuth")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}
