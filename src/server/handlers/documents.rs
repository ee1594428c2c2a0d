use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.store.get_all_documents().await;
    Ok(Json(json!({
        "total": documents.len(),
        "documents": documents,
    })))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.remove_document(&id).await? {
        return Err(ApiError::NotFound(format!("document '{}'", id)));
    }
    Ok(Json(json!({"deleted": id})))
}
