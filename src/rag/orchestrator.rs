//! Query-time decision engine.
//!
//! Classifies the query, retrieves when it is a knowledge query, filters by
//! the relevance threshold and picks one of three generation paths:
//! `direct-llm`, `rag` or `fallback` (backend unavailable).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context_builder::build_rag_messages;
use super::query_classifier::{QueryClassifier, QueryType};
use super::store::VectorStore;
use super::thinking::ThinkingParser;
use super::types::{Category, SearchResult};
use crate::core::config::{LlmConfig, RetrievalConfig};
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

pub const FALLBACK_MODEL: &str = "local-fallback";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub include_thinking: Option<bool>,
}

impl QueryOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMethod {
    #[serde(rename = "direct-llm")]
    DirectLlm,
    #[serde(rename = "rag")]
    Rag,
    #[serde(rename = "fallback")]
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub relevance_score: f32,
}

impl From<&SearchResult> for SourceRef {
    fn from(result: &SearchResult) -> Self {
        Self {
            id: result.chunk.id.clone(),
            title: result.chunk.title.clone(),
            category: result.chunk.category,
            url: result.chunk.url.clone(),
            relevance_score: result.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub generation_method: GenerationMethod,
    /// Results retrieved before the relevance filter.
    pub documents_retrieved: usize,
    pub model: String,
    pub query_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    pub sources: Vec<SourceRef>,
    pub metadata: ResponseMetadata,
}

pub struct RagOrchestrator {
    store: Arc<VectorStore>,
    llm: Arc<dyn LlmProvider>,
    classifier: QueryClassifier,
    thinking: ThinkingParser,
    llm_config: LlmConfig,
    retrieval: RetrievalConfig,
}

impl RagOrchestrator {
    pub fn new(
        store: Arc<VectorStore>,
        llm: Arc<dyn LlmProvider>,
        llm_config: LlmConfig,
        retrieval: RetrievalConfig,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            store,
            llm,
            classifier: QueryClassifier::new(&retrieval.casual_patterns)?,
            thinking: ThinkingParser::new()?,
            llm_config,
            retrieval,
        })
    }

    pub fn classify(&self, query: &str) -> QueryType {
        self.classifier.classify(query)
    }

    /// Health is probed on every call; a failing probe counts as unavailable.
    pub async fn backend_available(&self) -> bool {
        match self.llm.health_check().await {
            Ok(available) => available,
            Err(err) => {
                tracing::warn!("Chat backend health check failed: {}", err);
                false
            }
        }
    }

    pub async fn query(&self, options: QueryOptions) -> Result<RagResponse, ApiError> {
        let query = options.query.trim();
        if query.is_empty() {
            return Err(ApiError::BadRequest("query must not be empty".to_string()));
        }
        let top_k = options.top_k.unwrap_or(self.retrieval.top_k).max(1);
        let include_thinking = options
            .include_thinking
            .unwrap_or(self.retrieval.include_thinking);

        let query_type = self.classify(query);
        let available = self.backend_available().await;

        if query_type.is_casual() && available {
            tracing::debug!("Casual query, answering directly");
            let raw = self.chat(vec![ChatMessage::user(query)]).await?;
            return Ok(self.respond(
                raw,
                include_thinking,
                Vec::new(),
                GenerationMethod::DirectLlm,
                0,
                query_type,
            ));
        }

        let retrieved = self.store.search(query, top_k).await?;
        let relevant: Vec<&SearchResult> = retrieved
            .iter()
            .filter(|result| result.score > self.retrieval.relevance_threshold)
            .collect();
        tracing::debug!(
            "Retrieved {} results, {} above threshold {}",
            retrieved.len(),
            relevant.len(),
            self.retrieval.relevance_threshold
        );

        if !available {
            return Ok(self.fallback(&retrieved, query_type));
        }

        if relevant.is_empty() {
            let raw = self.chat(vec![ChatMessage::user(query)]).await?;
            return Ok(self.respond(
                raw,
                include_thinking,
                Vec::new(),
                GenerationMethod::DirectLlm,
                retrieved.len(),
                query_type,
            ));
        }

        let context: Vec<SearchResult> = relevant.iter().map(|r| (*r).clone()).collect();
        let raw = self.chat(build_rag_messages(query, &context)).await?;
        let sources = relevant.into_iter().map(SourceRef::from).collect();
        Ok(self.respond(
            raw,
            include_thinking,
            sources,
            GenerationMethod::Rag,
            retrieved.len(),
            query_type,
        ))
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        let request = ChatRequest::new(messages).with_config(&self.llm_config);
        self.llm.chat(request).await
    }

    fn respond(
        &self,
        raw: String,
        include_thinking: bool,
        sources: Vec<SourceRef>,
        method: GenerationMethod,
        documents_retrieved: usize,
        query_type: QueryType,
    ) -> RagResponse {
        let parsed = self.thinking.parse(&raw);
        RagResponse {
            answer: parsed.answer,
            thinking: parsed.thinking.filter(|_| include_thinking),
            sources,
            metadata: ResponseMetadata {
                generation_method: method,
                documents_retrieved,
                model: self.llm.model_info().model,
                query_type: query_type.as_str().to_string(),
            },
        }
    }

    fn fallback(&self, retrieved: &[SearchResult], query_type: QueryType) -> RagResponse {
        tracing::warn!("Chat backend unavailable, answering from retrieved documents");
        let answer = match retrieved.first() {
            Some(top) => format!(
                "The language model is currently unavailable, so here is the most relevant \
                 passage from the knowledge base (\"{}\"):\n\n{}",
                top.chunk.title, top.chunk.content
            ),
            None => "The language model is currently unavailable and no matching information \
                     was found in the knowledge base."
                .to_string(),
        };

        RagResponse {
            answer,
            thinking: None,
            sources: retrieved.iter().map(SourceRef::from).collect(),
            metadata: ResponseMetadata {
                generation_method: GenerationMethod::Fallback,
                documents_retrieved: retrieved.len(),
                model: FALLBACK_MODEL.to_string(),
                query_type: query_type.as_str().to_string(),
            },
        }
    }
}
