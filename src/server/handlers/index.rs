use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::rag::sample::sample_documents;
use crate::rag::{Document, IngestionUnit};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl IndexRequest {
    fn into_units(self) -> Vec<IngestionUnit> {
        self.urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(IngestionUnit::Url)
            .chain(self.documents.into_iter().map(IngestionUnit::Document))
            .collect()
    }
}

pub async fn start_indexing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IndexRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let units = payload.into_units();
    if units.is_empty() {
        return Err(ApiError::BadRequest(
            "provide at least one url or document".to_string(),
        ));
    }
    spawn_batch(&state, units)
}

pub async fn index_sample(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let units = sample_documents()
        .into_iter()
        .map(IngestionUnit::Document)
        .collect();
    spawn_batch(&state, units)
}

pub async fn indexing_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.indexing.progress()?))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.indexing.stats().await))
}

/// Reserves the ingestion slot now so a conflict is reported to this
/// request, then runs the batch in the background.
fn spawn_batch(
    state: &Arc<AppState>,
    units: Vec<IngestionUnit>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let total = units.len();
    let run = state.indexing.begin(units)?;
    tokio::spawn(async move {
        run.execute().await;
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "started",
            "totalUnits": total,
        })),
    ))
}
