use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::provider::LlmProvider;
use super::types::{ChatRequest, ModelInfo};
use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    chat_model: String,
    embedding_model: String,
    health_timeout: Duration,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
            client,
        })
    }

    fn chat_body(&self, request: &ChatRequest) -> Value {
        let mut options = Map::new();
        if let Some(t) = request.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = request.max_tokens {
            options.insert("num_predict".to_string(), json!(n));
        }

        json!({
            "model": self.chat_model,
            "messages": request.messages,
            "stream": false,
            "options": options,
        })
    }
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            base_url: self.base_url.clone(),
            model: self.chat_model.clone(),
        }
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(err) => {
                tracing::debug!("Ollama health check failed: {}", err);
                Ok(false)
            }
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.chat_body(&request);

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Ollama chat error ({}): {}",
                status, text
            )));
        }

        let payload: OllamaChatResponse = res.json().await.map_err(ApiError::upstream)?;
        Ok(payload.message.content)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Ollama embed error ({}): {}",
                status, text
            )));
        }

        let payload: OllamaEmbedResponse = res.json().await.map_err(ApiError::upstream)?;
        Ok(payload.embeddings)
    }
}
