use async_trait::async_trait;

use super::types::{ChatRequest, ModelInfo};
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama", "lmstudio")
    fn name(&self) -> &str;

    /// base url and chat model this provider talks to
    fn model_info(&self) -> ModelInfo;

    /// check if the provider is reachable; transport failures are `Ok(false)`
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// generate embeddings with the configured embedding model
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
