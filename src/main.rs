use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use ragbase_backend::core;
use ragbase_backend::core::config::AppPaths;
use ragbase_backend::server;
use ragbase_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    core::logging::init(&paths);

    let state = AppState::initialize(paths).await?;

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    let stats = state.store.get_stats().await;
    tracing::info!(
        "Listening on {} ({} chunks loaded from {})",
        addr,
        stats.total_documents,
        stats.store_path
    );
    if stats.total_documents == 0 {
        tracing::info!("Knowledge base is empty; POST /api/index/sample loads the starter corpus");
    }

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
