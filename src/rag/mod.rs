//! Retrieval-augmented generation.
//!
//! - `Chunker`: splits documents into overlapping, boundary-aware chunks
//! - `VectorStore`: chunk embeddings with a JSON snapshot and cosine search
//! - `IndexingService`: single-flight ingestion batches with progress
//! - `RagOrchestrator`: query classification, retrieval and generation

pub mod category;
pub mod chunker;
pub mod context_builder;
pub mod indexing;
pub mod orchestrator;
pub mod query_classifier;
pub mod sample;
pub mod store;
pub mod thinking;
pub mod types;

pub use chunker::{deduplicate, Chunker};
pub use indexing::{
    IndexingProgress, IndexingRun, IndexingService, IndexingStatus, IngestionUnit, KnowledgeStats,
};
pub use orchestrator::{GenerationMethod, QueryOptions, RagOrchestrator, RagResponse};
pub use store::{StoreStats, VectorStore};
pub use types::{Category, Chunk, Document, SearchResult};
