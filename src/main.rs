//! Wiring & DI. Entry point: load config, open the store, build the registry, run the UI.
//! No connector logic here.

use dotenv::dotenv;
use flow_pieces::adapters::builtin_registry;
use flow_pieces::adapters::persistence::JsonFileStore;
use flow_pieces::adapters::ui::tui::InteractiveRunner;
use flow_pieces::ports::StorePort;
use flow_pieces::shared::config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    flow_pieces::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config load failed, using defaults");
            AppConfig::default()
        }
    };
    if cfg.kommo_credentials().is_none() {
        info!("FLOW_PIECES_KOMMO_ACCESS_TOKEN not set; Kommo credentials will be prompted");
    }
    if cfg.zagomail_credentials().is_none() {
        info!("FLOW_PIECES_ZAGOMAIL_PUBLIC_KEY not set; Zagomail credentials will be prompted");
    }

    // --- Store: trigger webhook state survives restarts ---
    let store_path = cfg.store_path_or_default();
    let store_impl = JsonFileStore::new(&store_path);
    store_impl
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(path = %store_path, "webhook store ready");
    let store: Arc<dyn StorePort> = Arc::new(store_impl);

    let registry = Arc::new(builtin_registry());
    info!(
        pieces = registry.pieces().len(),
        webhook_url = %cfg.webhook_url_or_default(),
        "piece registry ready"
    );

    let runner = InteractiveRunner::new(registry, Arc::new(cfg), store);
    runner.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
