//! Inquire-based interactive runner.
//!
//! Pick a piece, then run an action, check credentials, drive a trigger's
//! lifecycle or feed it a webhook payload. Results are printed as pretty JSON.

use crate::adapters::{kommo, zagomail};
use crate::domain::{Credentials, DomainError, DropdownState, KommoAuth, ZagomailAuth};
use crate::ports::{StorePort, TriggerContext};
use crate::shared::config::AppConfig;
use crate::usecases::{Piece, PieceRegistry};
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Password, Select, Text};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightCyan))
        .with_highlighted_option_prefix(Styled::new("»").with_fg(Color::LightMagenta));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    RunAction,
    ValidateCredentials,
    EnableTrigger,
    DisableTrigger,
    DeliverPayload,
    TestTrigger,
    PickerOptions,
    Back,
}

impl Operation {
    const ALL: [Operation; 8] = [
        Operation::RunAction,
        Operation::ValidateCredentials,
        Operation::EnableTrigger,
        Operation::DisableTrigger,
        Operation::DeliverPayload,
        Operation::TestTrigger,
        Operation::PickerOptions,
        Operation::Back,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::RunAction => "Run action",
            Operation::ValidateCredentials => "Validate credentials",
            Operation::EnableTrigger => "Enable trigger (register webhook)",
            Operation::DisableTrigger => "Disable trigger (delete webhook)",
            Operation::DeliverPayload => "Deliver webhook payload to trigger",
            Operation::TestTrigger => "Show trigger sample events",
            Operation::PickerOptions => "Load picker options",
            Operation::Back => "Back",
        };
        f.write_str(label)
    }
}

/// Cancelled prompts (Esc / Ctrl-C) mean "go back".
fn answered<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Prompt(e.to_string())),
    }
}

/// Parses JSON typed at a prompt. Blank input is an empty object.
pub fn parse_json_input(text: &str) -> Result<Value, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(text).map_err(|e| DomainError::Validation(format!("Invalid JSON: {}", e)))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => error!(error = %e, "failed to render result"),
    }
}

/// Picker loaders each piece offers, by label.
fn picker_names(piece: &str) -> &'static [&'static str] {
    match piece {
        "kommo" => &["Leads", "Contacts"],
        "zagomail" => &["Lists"],
        _ => &[],
    }
}

async fn load_picker(piece: &str, picker: &str, auth: &Credentials) -> Option<DropdownState> {
    match (piece, picker) {
        ("kommo", "Leads") => Some(kommo::lead_options(auth).await),
        ("kommo", "Contacts") => Some(kommo::contact_options(auth).await),
        ("zagomail", "Lists") => Some(zagomail::list_options(auth).await),
        _ => None,
    }
}

pub struct InteractiveRunner {
    registry: Arc<PieceRegistry>,
    config: Arc<AppConfig>,
    store: Arc<dyn StorePort>,
}

impl InteractiveRunner {
    pub fn new(registry: Arc<PieceRegistry>, config: Arc<AppConfig>, store: Arc<dyn StorePort>) -> Self {
        Self {
            registry,
            config,
            store,
        }
    }

    pub async fn run(&self) -> Result<(), DomainError> {
        loop {
            let mut labels: Vec<String> = self
                .registry
                .pieces()
                .iter()
                .map(|p| p.display_name.to_string())
                .collect();
            labels.push("Exit".to_string());

            let Some(choice) = answered(Select::new("Choose a piece", labels).raw_prompt())? else {
                return Ok(());
            };
            let Some(piece) = self.registry.pieces().get(choice.index) else {
                return Ok(());
            };

            let Some(auth) = self.credentials(piece)? else {
                continue;
            };
            if let Err(e) = self.piece_menu(piece, &auth).await {
                error!(piece = piece.name, error = %e, "piece menu failed");
                eprintln!("Error: {}", e);
            }
        }
    }

    /// Configured credentials, else prompted ones.
    fn credentials(&self, piece: &Piece) -> Result<Option<Credentials>, DomainError> {
        if let Some(creds) = self.config.credentials_for(piece.name) {
            info!(piece = piece.name, "using configured credentials");
            return Ok(Some(creds));
        }

        match piece.name {
            "kommo" => {
                let Some(token) = answered(
                    Password::new("Kommo access token:")
                        .without_confirmation()
                        .prompt(),
                )?
                else {
                    return Ok(None);
                };
                let Some(subdomain) = answered(Text::new("Account subdomain:").prompt())? else {
                    return Ok(None);
                };
                Ok(Some(Credentials::Kommo(KommoAuth::new(token, Some(subdomain)))))
            }
            "zagomail" => {
                let Some(public_key) = answered(Text::new("Zagomail public key:").prompt())? else {
                    return Ok(None);
                };
                let Some(private_key) = answered(
                    Password::new("Zagomail private key:")
                        .without_confirmation()
                        .prompt(),
                )?
                else {
                    return Ok(None);
                };
                Ok(Some(Credentials::Zagomail(
                    ZagomailAuth::new(public_key, private_key)
                        .with_api_url(self.config.zagomail_api_url_or_default()),
                )))
            }
            other => Err(DomainError::Config(format!("No credential prompt for piece '{}'", other))),
        }
    }

    async fn piece_menu(&self, piece: &Piece, auth: &Credentials) -> Result<(), DomainError> {
        loop {
            let prompt = format!("{}: what next?", piece.display_name);
            let Some(op) = answered(Select::new(&prompt, Operation::ALL.to_vec()).prompt())? else {
                return Ok(());
            };

            let outcome = match op {
                Operation::Back => return Ok(()),
                Operation::RunAction => self.run_action(piece, auth).await,
                Operation::ValidateCredentials => self
                    .registry
                    .validate_credentials(piece.name, auth)
                    .await
                    .map(|check| print_json(&check)),
                Operation::PickerOptions => self.picker(piece, auth).await,
                Operation::EnableTrigger
                | Operation::DisableTrigger
                | Operation::DeliverPayload
                | Operation::TestTrigger => self.trigger_op(piece, auth, op).await,
            };
            if let Err(e) = outcome {
                eprintln!("Error: {}", e);
            }
        }
    }

    async fn run_action(&self, piece: &Piece, auth: &Credentials) -> Result<(), DomainError> {
        let labels: Vec<String> = piece
            .actions
            .iter()
            .map(|a| format!("{} ({})", a.display_name(), a.name()))
            .collect();
        let Some(choice) = answered(Select::new("Action", labels).raw_prompt())? else {
            return Ok(());
        };
        let Some(action) = piece.actions.get(choice.index) else {
            return Ok(());
        };
        println!("{}", action.description());

        let Some(raw) = answered(Text::new("Props (JSON):").with_default("{}").prompt())? else {
            return Ok(());
        };
        let props = parse_json_input(&raw)?;
        let out = self
            .registry
            .run_action(piece.name, action.name(), auth, props)
            .await?;
        print_json(&out);
        Ok(())
    }

    async fn trigger_op(&self, piece: &Piece, auth: &Credentials, op: Operation) -> Result<(), DomainError> {
        let labels: Vec<String> = piece
            .triggers
            .iter()
            .map(|t| format!("{} ({})", t.display_name(), t.name()))
            .collect();
        let Some(choice) = answered(Select::new("Trigger", labels).raw_prompt())? else {
            return Ok(());
        };
        let Some(trigger) = piece.triggers.get(choice.index) else {
            return Ok(());
        };

        let Some(raw_props) = answered(Text::new("Trigger props (JSON):").with_default("{}").prompt())? else {
            return Ok(());
        };
        let ctx = TriggerContext::new(
            auth.clone(),
            self.config.webhook_url_or_default(),
            self.store.clone(),
        )
        .with_props(parse_json_input(&raw_props)?);

        match op {
            Operation::EnableTrigger => {
                trigger.on_enable(&ctx).await?;
                println!("Enabled {} -> {}", trigger.name(), ctx.webhook_url);
            }
            Operation::DisableTrigger => {
                trigger.on_disable(&ctx).await?;
                println!("Disabled {}", trigger.name());
            }
            Operation::DeliverPayload => {
                let Some(raw) = answered(Text::new("Webhook payload (JSON):").prompt())? else {
                    return Ok(());
                };
                let events = trigger.run(&ctx, &parse_json_input(&raw)?).await?;
                println!("{} event(s)", events.len());
                print_json(&events);
            }
            _ => print_json(&trigger.test(&ctx).await?),
        }
        Ok(())
    }

    async fn picker(&self, piece: &Piece, auth: &Credentials) -> Result<(), DomainError> {
        let names = picker_names(piece.name);
        if names.is_empty() {
            println!("{} has no pickers.", piece.display_name);
            return Ok(());
        }
        let Some(name) = answered(Select::new("Picker", names.to_vec()).prompt())? else {
            return Ok(());
        };
        if let Some(state) = load_picker(piece.name, name, auth).await {
            print_json(&state);
        }
        Ok(())
    }
}
