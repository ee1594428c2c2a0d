//! Embedding gateway: text in, fixed-dimension vector out.
//!
//! The vector store only depends on [`EmbeddingGateway`]; the provider-backed
//! implementation forwards to whichever chat backend also serves embeddings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Name of the embedding model, for stats and logs.
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    /// Embeds texts one after another, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Embeds through an [`LlmProvider`], pinning the dimension seen first.
pub struct ProviderEmbeddingGateway {
    provider: Arc<dyn LlmProvider>,
    model: String,
    // 0 until the first successful embedding
    dimension: AtomicUsize,
}

impl ProviderEmbeddingGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        match self.dimension.load(Ordering::SeqCst) {
            0 => None,
            dim => Some(dim),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), ApiError> {
        if vector.is_empty() {
            return Err(ApiError::Upstream(
                "embedding backend returned an empty vector".to_string(),
            ));
        }
        match self
            .dimension
            .compare_exchange(0, vector.len(), Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(expected) if expected == vector.len() => Ok(()),
            Err(expected) => Err(ApiError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
        }
    }
}

#[async_trait]
impl EmbeddingGateway for ProviderEmbeddingGateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.provider.embed(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Err(ApiError::Upstream(
                "embedding backend returned no vectors".to_string(),
            ));
        }
        let vector = vectors.swap_remove(0);
        self.check_dimension(&vector)?;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatRequest, ModelInfo};
    use std::sync::Mutex;

    struct FixedProvider {
        replies: Mutex<Vec<Vec<Vec<f32>>>>,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                base_url: "mem://".to_string(),
                model: "fixed".to_string(),
            }
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    fn gateway(replies: Vec<Vec<Vec<f32>>>) -> ProviderEmbeddingGateway {
        let provider = Arc::new(FixedProvider {
            replies: Mutex::new(replies),
        });
        ProviderEmbeddingGateway::new(provider, "test-embed")
    }

    #[tokio::test]
    async fn pins_dimension_from_first_vector() {
        let gateway = gateway(vec![vec![vec![1.0, 0.0, 0.0]], vec![vec![1.0, 0.0]]]);

        assert_eq!(gateway.embed("a").await.unwrap().len(), 3);
        assert_eq!(gateway.dimension(), Some(3));

        let err = gateway.embed("b").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn empty_response_is_upstream_error() {
        let gateway = gateway(vec![vec![]]);
        assert!(matches!(
            gateway.embed("a").await,
            Err(ApiError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let gateway = gateway(vec![vec![vec![1.0, 0.0]], vec![vec![0.0, 1.0]]]);
        let vectors = gateway
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
