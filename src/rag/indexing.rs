//! Ingestion batches: fetch, chunk, dedup, index, with live progress.
//!
//! At most one batch runs at a time. The slot is taken with a
//! compare-and-set on `running` and released by [`RunningGuard`] on drop.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::chunker::{retain_unseen, Chunker};
use super::store::{StoreStats, VectorStore};
use super::types::Document;
use crate::core::errors::ApiError;
use crate::scraper::ContentSource;

#[derive(Debug, Clone)]
pub enum IngestionUnit {
    Url(String),
    Document(Document),
}

impl IngestionUnit {
    /// Label used in progress errors.
    pub fn label(&self) -> String {
        match self {
            IngestionUnit::Url(url) => url.clone(),
            IngestionUnit::Document(doc) => doc.source_key().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStatus {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitError {
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingProgress {
    pub status: IndexingStatus,
    pub total_units: usize,
    pub processed_units: usize,
    /// Chunks newly added to the store in this batch.
    pub total_chunks: usize,
    pub errors: Vec<UnitError>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl Default for IndexingProgress {
    fn default() -> Self {
        Self {
            status: IndexingStatus::Idle,
            total_units: 0,
            processed_units: 0,
            total_chunks: 0,
            errors: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub total_chunks: usize,
    pub unique_sources: usize,
    pub by_category: BTreeMap<String, usize>,
    pub store: StoreStats,
}

#[derive(Clone)]
pub struct IndexingService {
    store: Arc<VectorStore>,
    chunker: Arc<Chunker>,
    source: Arc<dyn ContentSource>,
    progress: Arc<Mutex<IndexingProgress>>,
    running: Arc<AtomicBool>,
}

impl IndexingService {
    pub fn new(store: Arc<VectorStore>, chunker: Chunker, source: Arc<dyn ContentSource>) -> Self {
        Self {
            store,
            chunker: Arc::new(chunker),
            source,
            progress: Arc::new(Mutex::new(IndexingProgress::default())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> Result<IndexingProgress, ApiError> {
        let guard = self.progress.lock().map_err(ApiError::internal)?;
        Ok(guard.clone())
    }

    /// Reserves the ingestion slot and resets progress for `units`.
    pub fn begin(&self, units: Vec<IngestionUnit>) -> Result<IndexingRun, ApiError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ApiError::Conflict(
                "an indexing batch is already running".to_string(),
            ));
        }
        let guard = RunningGuard(self.running.clone());

        {
            let mut progress = self.progress.lock().map_err(ApiError::internal)?;
            *progress = IndexingProgress {
                status: IndexingStatus::Running,
                total_units: units.len(),
                started_at: Some(Utc::now().to_rfc3339()),
                ..IndexingProgress::default()
            };
        }

        tracing::info!("Indexing batch started with {} units", units.len());
        Ok(IndexingRun {
            service: self.clone(),
            units,
            _guard: guard,
        })
    }

    pub async fn run(&self, units: Vec<IngestionUnit>) -> Result<IndexingProgress, ApiError> {
        Ok(self.begin(units)?.execute().await)
    }

    /// Aggregates over the store's current contents.
    pub async fn stats(&self) -> KnowledgeStats {
        let chunks = self.store.get_all_documents().await;
        let mut by_category = BTreeMap::new();
        let mut sources = HashSet::new();

        for chunk in &chunks {
            *by_category
                .entry(chunk.category.as_str().to_string())
                .or_insert(0) += 1;
            sources.insert(chunk.source_id().to_string());
        }

        KnowledgeStats {
            total_chunks: chunks.len(),
            unique_sources: sources.len(),
            by_category,
            store: self.store.get_stats().await,
        }
    }

    fn update(&self, apply: impl FnOnce(&mut IndexingProgress)) {
        match self.progress.lock() {
            Ok(mut progress) => apply(&mut progress),
            Err(err) => tracing::error!("Indexing progress lock poisoned: {}", err),
        }
    }

    async fn ingest(
        &self,
        unit: &IngestionUnit,
        seen: &mut HashSet<String>,
    ) -> Result<usize, ApiError> {
        let document = match unit {
            IngestionUnit::Url(url) => self.source.fetch(url).await?,
            IngestionUnit::Document(doc) => doc.clone(),
        };

        let chunks = self.chunker.chunk(&document);
        if chunks.is_empty() {
            return Err(ApiError::BadRequest("no content extracted".to_string()));
        }

        let fresh = retain_unseen(chunks, seen);
        if fresh.is_empty() {
            return Ok(0);
        }
        // A failed unit must not shadow the same content in later units.
        let hashes: Vec<String> = fresh.iter().map(|c| c.content_hash.clone()).collect();
        let added = self.store.index_documents(fresh).await?;
        seen.extend(hashes);
        Ok(added)
    }
}

/// A reserved ingestion batch. Dropping it releases the slot.
pub struct IndexingRun {
    service: IndexingService,
    units: Vec<IngestionUnit>,
    _guard: RunningGuard,
}

impl IndexingRun {
    /// Processes every unit. Per-unit failures are recorded in progress and
    /// never abort the batch.
    pub async fn execute(self) -> IndexingProgress {
        let service = &self.service;
        let mut seen = HashSet::new();

        for unit in &self.units {
            let label = unit.label();
            match service.ingest(unit, &mut seen).await {
                Ok(added) => {
                    tracing::debug!("Unit {} added {} chunks", label, added);
                    service.update(|p| p.total_chunks += added);
                }
                Err(err) => {
                    let message = match err {
                        ApiError::BadRequest(message) => message,
                        other => other.to_string(),
                    };
                    tracing::warn!("Unit {} failed: {}", label, message);
                    service.update(|p| {
                        p.errors.push(UnitError {
                            source: label.clone(),
                            message,
                        })
                    });
                }
            }
            service.update(|p| p.processed_units += 1);
        }

        let mut finished = IndexingProgress::default();
        service.update(|p| {
            p.status = IndexingStatus::Completed;
            p.completed_at = Some(Utc::now().to_rfc3339());
            finished = p.clone();
        });
        tracing::info!(
            "Indexing batch completed: {} units, {} chunks, {} errors",
            finished.processed_units,
            finished.total_chunks,
            finished.errors.len()
        );
        finished
    }
}

struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
