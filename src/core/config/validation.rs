use regex::Regex;

use super::settings::AppConfig;
use crate::core::errors::ApiError;

pub fn validate_config(config: &AppConfig) -> Result<(), ApiError> {
    let chunking = &config.chunking;
    validate_range("chunking.chunk_size", chunking.chunk_size as u64, 1, 1_000_000)?;
    if chunking.chunk_overlap >= chunking.chunk_size {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at 'chunking.chunk_overlap': must be smaller than chunk_size ({})",
            chunking.chunk_size
        )));
    }

    let retrieval = &config.retrieval;
    validate_range("retrieval.top_k", retrieval.top_k as u64, 1, 1_000)?;
    if !(-1.0..=1.0).contains(&retrieval.relevance_threshold) {
        return Err(ApiError::BadRequest(
            "Invalid config at 'retrieval.relevance_threshold': must be between -1 and 1"
                .to_string(),
        ));
    }
    for (index, pattern) in retrieval.casual_patterns.iter().enumerate() {
        if let Err(err) = Regex::new(pattern) {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at 'retrieval.casual_patterns[{}]': {}",
                index, err
            )));
        }
    }

    let llm = &config.llm;
    validate_non_empty("llm.base_url", &llm.base_url)?;
    validate_non_empty("llm.chat_model", &llm.chat_model)?;
    validate_non_empty("llm.embedding_model", &llm.embedding_model)?;
    validate_range("llm.request_timeout_secs", llm.request_timeout_secs, 1, 86_400)?;
    validate_range("llm.health_timeout_secs", llm.health_timeout_secs, 1, 3_600)?;

    validate_range("scraper.timeout_secs", config.scraper.timeout_secs, 1, 86_400)?;
    validate_range("scraper.max_retries", config.scraper.max_retries as u64, 0, 10)?;

    Ok(())
}

fn validate_range(path: &str, value: u64, min: u64, max: u64) -> Result<(), ApiError> {
    if value < min || value > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty(path: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}
