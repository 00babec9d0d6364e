//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use dropsync::adapters::backend::HttpBackend;
use dropsync::adapters::oauth::{CallbackServer, SystemBrowser};
use dropsync::adapters::persistence::ConnectionJson;
use dropsync::adapters::ui::tui::TuiInputPort;
use dropsync::ports::{AuthWindowPort, BackendPort, ConnectionStorePort, InputPort};
use dropsync::shared::config::AppConfig;
use dropsync::usecases::{
    AuthResultListener, AuthSessionBroker, BackupImportCoordinator, ConnectionResolver,
    ManualLinkService, PendingAuth,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => debug!("no .env found"),
    }

    dropsync::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_default();
    let api_url = cfg.api_url_or_default();
    info!(%api_url, "backend API");

    let data_dir = PathBuf::from(cfg.data_dir_or_default());
    let store: Arc<dyn ConnectionStorePort> =
        Arc::new(ConnectionJson::new(data_dir.join("connection.json")));
    let backend: Arc<dyn BackendPort> = Arc::new(HttpBackend::new(api_url));
    let window: Arc<dyn AuthWindowPort> = Arc::new(SystemBrowser);
    let pending = Arc::new(PendingAuth::new());

    // --- Callback plumbing: loopback redirect -> channel -> listener task ---
    let callback_addr = cfg.callback_addr();
    let (callback_tx, callback_rx) = mpsc::unbounded_channel();
    let _callback_server = CallbackServer::bind(&callback_addr, callback_tx)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    let listener = AuthResultListener::new(
        Arc::clone(&backend),
        Arc::clone(&store),
        Arc::clone(&window),
        Arc::clone(&pending),
        outcome_tx,
    );
    let _listener_handle = listener.spawn(callback_rx);

    // --- Services ---
    let broker = Arc::new(AuthSessionBroker::new(
        Arc::clone(&backend),
        Arc::clone(&window),
        Arc::clone(&pending),
    ));
    let resolver = Arc::new(ConnectionResolver::new(
        Arc::clone(&backend),
        Arc::clone(&store),
    ));
    let manual = Arc::new(ManualLinkService::new(
        Arc::clone(&backend),
        Arc::clone(&store),
    ));
    let importer = Arc::new(BackupImportCoordinator::new(Arc::clone(&backend)));

    // --- Run (restore -> connect -> import loop) ---
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        backend,
        broker,
        resolver,
        manual,
        importer,
        pending,
        outcome_rx,
    ));

    input_port.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
