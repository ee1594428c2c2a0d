use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::embedding::{EmbeddingGateway, ProviderEmbeddingGateway};
use crate::llm::{build_provider, LlmProvider};
use crate::rag::{Chunker, IndexingService, RagOrchestrator, VectorStore};
use crate::scraper::{ContentSource, HttpContentSource};

pub mod error;

use error::InitializationError;

/// Service graph shared by every route, built once at startup.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm: Arc<dyn LlmProvider>,
    pub embeddings: Arc<dyn EmbeddingGateway>,
    pub store: Arc<VectorStore>,
    pub indexing: IndexingService,
    pub rag: Arc<RagOrchestrator>,
}

impl AppState {
    /// Loads config, connects the configured backend and loads the vector
    /// store snapshot.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone())
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let llm = build_provider(&config.llm).map_err(|e| InitializationError::Llm(e.into()))?;
        let source: Arc<dyn ContentSource> = Arc::new(
            HttpContentSource::new(&config.scraper)
                .map_err(|e| InitializationError::Source(e.into()))?,
        );

        Self::assemble(paths, config, llm, source).await
    }

    /// Wires the services around an already-built backend and content source.
    pub async fn assemble(
        paths: Arc<AppPaths>,
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
        source: Arc<dyn ContentSource>,
    ) -> Result<Arc<Self>, InitializationError> {
        let embeddings: Arc<dyn EmbeddingGateway> = Arc::new(ProviderEmbeddingGateway::new(
            llm.clone(),
            config.llm.embedding_model.clone(),
        ));

        let snapshot_path = match config.store.snapshot_path.as_deref() {
            Some(raw) if !raw.trim().is_empty() => paths.resolve_data_path(raw),
            _ => paths.snapshot_path.clone(),
        };
        let store = Arc::new(VectorStore::new(embeddings.clone(), snapshot_path));
        store
            .initialize()
            .await
            .map_err(|e| InitializationError::Store(e.into()))?;

        let indexing = IndexingService::new(
            store.clone(),
            Chunker::new(config.chunking.clone()),
            source,
        );

        let rag = Arc::new(
            RagOrchestrator::new(
                store.clone(),
                llm.clone(),
                config.llm.clone(),
                config.retrieval.clone(),
            )
            .map_err(|e| InitializationError::Rag(e.into()))?,
        );

        Ok(Arc::new(AppState {
            config: Arc::new(config),
            llm,
            embeddings,
            store,
            indexing,
            rag,
        }))
    }
}
