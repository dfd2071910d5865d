//! Application configuration. Connector credentials, store path, callback URL.

use crate::adapters::zagomail::client::DEFAULT_API_URL;
use crate::domain::{Credentials, KommoAuth, ZagomailAuth};
use serde::Deserialize;

pub const DEFAULT_STORE_PATH: &str = "./data/store.json";

/// Placeholder callback used by the interactive runner when none is configured.
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:8080/webhook";

/// Read from `FLOW_PIECES_*` env vars (and `.env`), plus an optional file named by `FLOW_PIECES_CONFIG`.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Kommo
    // ─────────────────────────────────────────────────────────────────────────
    /// OAuth2 access token. Read from FLOW_PIECES_KOMMO_ACCESS_TOKEN.
    #[serde(default)]
    pub kommo_access_token: Option<String>,

    /// Account subdomain (`acme` for acme.kommo.com). Read from FLOW_PIECES_KOMMO_SUBDOMAIN.
    #[serde(default)]
    pub kommo_subdomain: Option<String>,

    /// Base URL override. Read from FLOW_PIECES_KOMMO_BASE_URL.
    #[serde(default)]
    pub kommo_base_url: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Zagomail
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from FLOW_PIECES_ZAGOMAIL_PUBLIC_KEY.
    #[serde(default)]
    pub zagomail_public_key: Option<String>,

    /// Stored with the connection; data operations only use the public key.
    #[serde(default)]
    pub zagomail_private_key: Option<String>,

    /// Read from FLOW_PIECES_ZAGOMAIL_API_URL.
    #[serde(default)]
    pub zagomail_api_url: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Runner
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub store_path: Option<String>,

    /// Callback URL registered when enabling triggers from the runner.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("FLOW_PIECES"));
        if let Ok(path) = std::env::var("FLOW_PIECES_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn store_path_or_default(&self) -> String {
        non_empty(&self.store_path).unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
    }

    pub fn webhook_url_or_default(&self) -> String {
        non_empty(&self.webhook_url).unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string())
    }

    pub fn zagomail_api_url_or_default(&self) -> String {
        non_empty(&self.zagomail_api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Kommo connection, if a token is configured. The subdomain is checked at use time.
    pub fn kommo_credentials(&self) -> Option<Credentials> {
        let token = non_empty(&self.kommo_access_token)?;
        let mut auth = KommoAuth::new(token, non_empty(&self.kommo_subdomain));
        if let Some(base_url) = non_empty(&self.kommo_base_url) {
            auth = auth.with_base_url(base_url);
        }
        Some(Credentials::Kommo(auth))
    }

    pub fn zagomail_credentials(&self) -> Option<Credentials> {
        let public_key = non_empty(&self.zagomail_public_key)?;
        let private_key = non_empty(&self.zagomail_private_key).unwrap_or_default();
        Some(Credentials::Zagomail(
            ZagomailAuth::new(public_key, private_key).with_api_url(self.zagomail_api_url_or_default()),
        ))
    }

    /// Credentials for a piece by name.
    pub fn credentials_for(&self, piece: &str) -> Option<Credentials> {
        match piece {
            "kommo" => self.kommo_credentials(),
            "zagomail" => self.zagomail_credentials(),
            _ => None,
        }
    }
}
