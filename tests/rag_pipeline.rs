use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ragbase_backend::core::config::{AppConfig, AppPaths};
use ragbase_backend::core::errors::ApiError;
use ragbase_backend::llm::{ChatRequest, LlmProvider, ModelInfo};
use ragbase_backend::rag::sample::sample_documents;
use ragbase_backend::rag::{
    Document, GenerationMethod, IndexingStatus, IngestionUnit, QueryOptions,
};
use ragbase_backend::scraper::ContentSource;
use ragbase_backend::state::AppState;

const VOCABULARY: [&str; 6] = ["return", "refund", "shipping", "warranty", "password", "token"];

/// Offline backend: keyword-count embeddings and a canned chat reply.
struct OfflineBackend {
    healthy: AtomicBool,
    chats: Mutex<Vec<ChatRequest>>,
}

impl OfflineBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            chats: Mutex::new(Vec::new()),
        })
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmProvider for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            base_url: "http://offline".to_string(),
            model: "offline-chat".to_string(),
        }
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        self.chats.lock().unwrap().push(request);
        Ok("<think>reasoning</think>Here is what I found.".to_string())
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                VOCABULARY
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

struct UnreachableWeb;

#[async_trait]
impl ContentSource for UnreachableWeb {
    async fn fetch(&self, url: &str) -> Result<Document, ApiError> {
        Err(ApiError::Upstream(format!("{} is unreachable", url)))
    }
}

async fn state_in(dir: &tempfile::TempDir, backend: Arc<OfflineBackend>) -> Arc<AppState> {
    let paths = Arc::new(AppPaths::with_data_dir(
        dir.path().to_path_buf(),
        dir.path().join("data"),
    ));
    AppState::assemble(paths, AppConfig::default(), backend, Arc::new(UnreachableWeb))
        .await
        .unwrap()
}

fn sample_units() -> Vec<IngestionUnit> {
    sample_documents()
        .into_iter()
        .map(IngestionUnit::Document)
        .collect()
}

#[tokio::test]
async fn ingest_persist_reload_and_query() {
    let dir = tempfile::tempdir().unwrap();
    let backend = OfflineBackend::new();
    let state = state_in(&dir, backend.clone()).await;

    let progress = state.indexing.run(sample_units()).await.unwrap();
    assert_eq!(progress.status, IndexingStatus::Completed);
    assert_eq!(progress.processed_units, 5);
    assert_eq!(progress.total_chunks, 5);
    assert!(progress.errors.is_empty());

    // Same sources again: ids already stored, nothing new.
    let again = state.indexing.run(sample_units()).await.unwrap();
    assert_eq!(again.total_chunks, 0);
    assert_eq!(state.store.count().await, 5);

    let stats = state.indexing.stats().await;
    assert_eq!(stats.unique_sources, 5);
    assert_eq!(stats.store.embedding_dimension, Some(VOCABULARY.len()));
    assert!(stats.store.is_indexed);

    let reloaded = state_in(&dir, backend.clone()).await;
    assert_eq!(
        reloaded.store.get_all_documents().await,
        state.store.get_all_documents().await
    );

    let response = reloaded
        .rag
        .query(QueryOptions::new("What is your return policy?"))
        .await
        .unwrap();
    assert_eq!(response.metadata.generation_method, GenerationMethod::Rag);
    assert_eq!(response.metadata.query_type, "knowledge");
    assert_eq!(response.sources[0].title, "Return Policy (Part 1/1)");
    assert!(response.sources[0].relevance_score > 0.3);
    assert_eq!(response.answer, "Here is what I found.");
    assert!(response.thinking.is_none());
}

#[tokio::test]
async fn greeting_goes_straight_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let backend = OfflineBackend::new();
    let state = state_in(&dir, backend.clone()).await;
    state.indexing.run(sample_units()).await.unwrap();

    let response = state.rag.query(QueryOptions::new("hello")).await.unwrap();

    assert_eq!(response.metadata.generation_method, GenerationMethod::DirectLlm);
    assert_eq!(response.metadata.query_type, "casual");
    assert!(response.sources.is_empty());
    assert_eq!(backend.chats.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn nonsense_query_depends_on_backend_health() {
    let dir = tempfile::tempdir().unwrap();
    let backend = OfflineBackend::new();
    let state = state_in(&dir, backend.clone()).await;
    state.indexing.run(sample_units()).await.unwrap();

    let up = state.rag.query(QueryOptions::new("qwzx vlorp")).await.unwrap();
    assert_eq!(up.metadata.generation_method, GenerationMethod::DirectLlm);
    assert!(up.sources.is_empty());
    assert_eq!(up.metadata.documents_retrieved, 3);

    backend.set_healthy(false);
    let down = state.rag.query(QueryOptions::new("qwzx vlorp")).await.unwrap();
    assert_eq!(down.metadata.generation_method, GenerationMethod::Fallback);
    assert_eq!(down.metadata.model, "local-fallback");
    assert_eq!(down.sources.len(), 3);
    assert!(down.sources.iter().all(|source| source.relevance_score <= 0.3));
}

#[tokio::test]
async fn removal_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let backend = OfflineBackend::new();
    let state = state_in(&dir, backend.clone()).await;
    state.indexing.run(sample_units()).await.unwrap();

    let id = state.store.get_all_documents().await[0].id.clone();
    assert!(state.store.remove_document(&id).await.unwrap());
    assert!(!state.store.remove_document(&id).await.unwrap());

    let reloaded = state_in(&dir, backend).await;
    assert_eq!(reloaded.store.count().await, 4);
    assert!(reloaded
        .store
        .get_all_documents()
        .await
        .iter()
        .all(|chunk| chunk.id != id));
}

#[tokio::test]
async fn failed_urls_are_reported_per_unit() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, OfflineBackend::new()).await;

    let progress = state
        .indexing
        .run(vec![
            IngestionUnit::Url("https://example.com/returns".to_string()),
            IngestionUnit::Document(sample_documents().remove(0)),
        ])
        .await
        .unwrap();

    assert_eq!(progress.processed_units, 2);
    assert_eq!(progress.total_chunks, 1);
    assert_eq!(progress.errors.len(), 1);
    assert_eq!(progress.errors[0].source, "https://example.com/returns");
}
