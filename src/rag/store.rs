//! In-process vector store with a JSON snapshot.
//!
//! Chunks and their embeddings live in two parallel vectors that are only
//! ever mutated together under one write lock. Search is a linear cosine
//! scan. Every mutating operation rewrites the whole snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::types::{Chunk, SearchResult};
use crate::core::errors::ApiError;
use crate::embedding::EmbeddingGateway;
use crate::vector_math::rank_descending_by_cosine;

pub const SNAPSHOT_VERSION: &str = "1.0";

/// On-disk layout. `documents[i]` pairs with `embeddings[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub documents: Vec<Chunk>,
    pub embeddings: Vec<Vec<f32>>,
    pub is_indexed: bool,
    pub saved_at: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_documents: usize,
    pub is_indexed: bool,
    pub embedding_dimension: Option<usize>,
    pub store_path: String,
}

#[derive(Default)]
struct StoreInner {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    is_indexed: bool,
}

impl StoreInner {
    fn contains(&self, id: &str) -> bool {
        self.chunks.iter().any(|chunk| chunk.id == id)
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self.chunks.clone(),
            embeddings: self.embeddings.clone(),
            is_indexed: self.is_indexed,
            saved_at: Utc::now().to_rfc3339(),
            version: SNAPSHOT_VERSION.to_string(),
        }
    }
}

pub struct VectorStore {
    embeddings: Arc<dyn EmbeddingGateway>,
    snapshot_path: PathBuf,
    inner: RwLock<StoreInner>,
    // serialises snapshot writes so an older state never lands last
    save_lock: Mutex<()>,
    initialized: Mutex<bool>,
}

impl VectorStore {
    pub fn new(embeddings: Arc<dyn EmbeddingGateway>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            embeddings,
            snapshot_path: snapshot_path.into(),
            inner: RwLock::new(StoreInner::default()),
            save_lock: Mutex::new(()),
            initialized: Mutex::new(false),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Loads the snapshot on first call; later calls are no-ops.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }
        self.load().await?;
        *initialized = true;
        Ok(())
    }

    /// Replaces the in-memory state with the snapshot. A missing file leaves
    /// the store as it is; any other failure is returned and the state is
    /// untouched.
    pub async fn load(&self) -> Result<(), ApiError> {
        let raw = match tokio::fs::read_to_string(&self.snapshot_path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No vector store snapshot at {}, starting empty",
                    self.snapshot_path.display()
                );
                return Ok(());
            }
            Err(err) => {
                return Err(ApiError::Internal(format!(
                    "failed to read snapshot {}: {}",
                    self.snapshot_path.display(),
                    err
                )))
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|err| {
            ApiError::Internal(format!(
                "failed to parse snapshot {}: {}",
                self.snapshot_path.display(),
                err
            ))
        })?;

        if snapshot.documents.len() != snapshot.embeddings.len() {
            return Err(ApiError::Internal(format!(
                "corrupt snapshot: {} documents but {} embeddings",
                snapshot.documents.len(),
                snapshot.embeddings.len()
            )));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot version {} differs from {}, loading anyway",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        let mut inner = self.inner.write().await;
        inner.chunks = snapshot.documents;
        inner.embeddings = snapshot.embeddings;
        inner.is_indexed = snapshot.is_indexed;
        tracing::info!(
            "Loaded {} chunks from {}",
            inner.chunks.len(),
            self.snapshot_path.display()
        );
        Ok(())
    }

    /// Overwrites the snapshot with the current state.
    pub async fn save(&self) -> Result<(), ApiError> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.inner.read().await.to_snapshot();
        let payload = serde_json::to_vec(&snapshot).map_err(ApiError::internal)?;

        if let Some(parent) = self.snapshot_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ApiError::internal)?;
        }
        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(ApiError::internal)?;
        tokio::fs::rename(&tmp_path, &self.snapshot_path)
            .await
            .map_err(ApiError::internal)?;

        tracing::debug!(
            "Saved {} chunks to {}",
            snapshot.documents.len(),
            self.snapshot_path.display()
        );
        Ok(())
    }

    /// Embeds and appends every chunk whose id is not stored yet, then saves.
    /// Returns how many were added. On an embedding failure the chunks added
    /// so far stay in memory unsaved and the error is returned.
    pub async fn index_documents(&self, chunks: Vec<Chunk>) -> Result<usize, ApiError> {
        let pending: Vec<Chunk> = {
            let inner = self.inner.read().await;
            chunks
                .into_iter()
                .filter(|chunk| {
                    let known = inner.contains(&chunk.id);
                    if known {
                        tracing::debug!("Chunk {} already indexed, skipping", chunk.id);
                    }
                    !known
                })
                .collect()
        };

        let mut added = 0;
        for chunk in pending {
            let vector = self.embeddings.embed(&chunk.embedding_text()).await?;

            let mut inner = self.inner.write().await;
            // another caller may have added the id while we were embedding
            if inner.contains(&chunk.id) {
                continue;
            }
            inner.chunks.push(chunk);
            inner.embeddings.push(vector);
            added += 1;
        }

        self.inner.write().await.is_indexed = true;
        self.save().await?;

        if added > 0 {
            tracing::info!("Indexed {} new chunks", added);
        }
        Ok(added)
    }

    /// Top `top_k` chunks by cosine similarity, highest first. An empty store
    /// or a blank query gives an empty result.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, ApiError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if self.inner.read().await.chunks.is_empty() {
            tracing::warn!("Search on an empty vector store");
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed(query).await?;

        let inner = self.inner.read().await;
        let ranked = rank_descending_by_cosine(&query_vector, &inner.embeddings)?;
        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| SearchResult {
                chunk: inner.chunks[idx].clone(),
                score,
            })
            .collect())
    }

    /// Removes a chunk and its embedding. Saves only when something changed.
    pub async fn remove_document(&self, id: &str) -> Result<bool, ApiError> {
        {
            let mut inner = self.inner.write().await;
            let Some(idx) = inner.chunks.iter().position(|chunk| chunk.id == id) else {
                return Ok(false);
            };
            inner.chunks.remove(idx);
            inner.embeddings.remove(idx);
        }
        self.save().await?;
        tracing::info!("Removed chunk {}", id);
        Ok(true)
    }

    pub async fn get_all_documents(&self) -> Vec<Chunk> {
        self.inner.read().await.chunks.clone()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    pub async fn get_stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        StoreStats {
            total_documents: inner.chunks.len(),
            is_indexed: inner.is_indexed,
            embedding_dimension: inner.embeddings.first().map(Vec::len),
            store_path: self.snapshot_path.display().to_string(),
        }
    }
}
