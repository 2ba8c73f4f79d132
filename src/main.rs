use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use cardio_chat::core::config::{AppPaths, ConfigService};
use cardio_chat::core::logging::{self, LogTarget};
use cardio_chat::server;
use cardio_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, LogTarget::Server).context("Failed to install logging")?;

    let config_service = ConfigService::new(paths.clone());
    let state = AppState::initialize(&config_service).context("Failed to initialize backend")?;

    for key in state.config.missing_server_keys() {
        tracing::warn!(key, "Credential not configured; requests that need it will fail");
    }

    if state.prepares_index_on_startup() {
        match state.prepare_index().await {
            Ok(index) => tracing::info!(
                index = %index.name,
                dimension = index.dimension,
                "Vector index ready"
            ),
            Err(err) => tracing::warn!("Vector index check failed: {}", err),
        }
    }

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
