use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::rag::QueryOptions;
use crate::state::AppState;

/// Upper bound on `topK` accepted from clients.
const MAX_TOP_K: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<QueryOptions>,
) -> Result<impl IntoResponse, ApiError> {
    payload.top_k = validate_top_k(payload.top_k)?;
    let response = state.rag.query(payload).await?;
    Ok(Json(response))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let top_k = validate_top_k(payload.top_k)?.unwrap_or(state.config.retrieval.top_k);
    let results = state.store.search(&payload.query, top_k).await?;
    Ok(Json(json!({
        "query": payload.query,
        "results": results,
    })))
}

fn validate_top_k(top_k: Option<usize>) -> Result<Option<usize>, ApiError> {
    match top_k {
        Some(0) => Err(ApiError::BadRequest("topK must be at least 1".to_string())),
        Some(k) if k > MAX_TOP_K => Err(ApiError::BadRequest(format!(
            "topK must be at most {}",
            MAX_TOP_K
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_bounds() {
        assert!(validate_top_k(Some(0)).is_err());
        assert!(validate_top_k(Some(MAX_TOP_K + 1)).is_err());
        assert_eq!(validate_top_k(Some(5)).unwrap(), Some(5));
        assert_eq!(validate_top_k(None).unwrap(), None);
    }
}
