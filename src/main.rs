use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use rag_backend::core::config::{AppPaths, ConfigService};
use rag_backend::core::logging;
use rag_backend::server;
use rag_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths.clone());
    let settings = config
        .load_settings()
        .with_context(|| format!("Failed to load {}", paths.config_path.display()))?;

    logging::init(&paths);
    tracing::info!("Effective configuration: {}", config.redacted_view(&settings));

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::initialize(paths.clone(), settings)?;

    let reports = state.bootstrap().await;
    if reports.is_empty() {
        tracing::info!("No documents ingested at startup");
    }

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
