use serde::{Deserialize, Serialize};

use crate::core::config::LlmConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub base_url: String,
    pub model: String,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Fills unset sampling options from the configured defaults.
    pub fn with_config(mut self, config: &LlmConfig) -> Self {
        self.temperature = self.temperature.or(config.temperature);
        self.max_tokens = self.max_tokens.or(config.max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_config_keeps_explicit_values() {
        let config = LlmConfig {
            temperature: Some(0.2),
            max_tokens: Some(256),
            ..LlmConfig::default()
        };
        let mut request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        request.temperature = Some(0.9);

        let request = request.with_config(&config);
        assert_eq!(request.temperature, Some(0.9));
        assert_eq!(request.max_tokens, Some(256));
    }
}
