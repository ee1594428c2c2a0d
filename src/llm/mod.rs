pub mod lmstudio;
pub mod ollama;
pub mod provider;
pub mod types;

use std::sync::Arc;

use crate::core::config::{LlmConfig, LlmProviderKind};
use crate::core::errors::ApiError;

pub use lmstudio::LmStudioProvider;
pub use ollama::OllamaProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest, ModelInfo};

/// Builds the configured chat/embedding backend.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ApiError> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        LlmProviderKind::Ollama => Arc::new(OllamaProvider::new(config)?),
        LlmProviderKind::Lmstudio => Arc::new(LmStudioProvider::new(config)?),
    };
    tracing::info!(
        "LLM provider: {} at {} (chat={}, embedding={})",
        provider.name(),
        config.base_url,
        config.chat_model,
        config.embedding_model
    );
    Ok(provider)
}
