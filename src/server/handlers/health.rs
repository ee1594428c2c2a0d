use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm_available = state.rag.backend_available().await;
    let store = state.store.get_stats().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "llm": {
            "available": llm_available,
            "provider": state.llm.name(),
            "modelInfo": state.llm.model_info(),
            "embeddingModel": state.embeddings.model(),
        },
        "store": store,
        "indexing": state.indexing.is_running(),
    }))
}
