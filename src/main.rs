use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rituals_bridge::{
    api::{self, AppState},
    config::Config,
    rituals::RitualsClient,
    session_store::{FileSessionStore, MemorySessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; variables may also come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.session_file {
        Some(path) => {
            info!(path = %path.display(), "Persisting session to file");
            Arc::new(FileSessionStore::new(path))
        }
        None => Arc::new(MemorySessionStore::new()),
    };

    let client = RitualsClient::from_config(&config, store)?;
    if !client.session().restore().await {
        info!("No usable stored session; will authenticate on first request");
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(AppState::new(client)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
