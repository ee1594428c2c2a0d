//! Separates `<think>` / `<thinking>` reasoning blocks from a model answer.

use regex::Regex;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub answer: String,
    pub thinking: Option<String>,
}

pub struct ThinkingParser {
    // the regex crate has no backreferences, so one alternation per tag
    block: Regex,
}

impl ThinkingParser {
    pub fn new() -> Result<Self, ApiError> {
        let block = Regex::new(r"(?is)<think>(.*?)</think>|<thinking>(.*?)</thinking>")
            .map_err(ApiError::internal)?;
        Ok(Self { block })
    }

    /// Strips every paired block and joins their bodies. Unpaired tags are
    /// left in the answer.
    pub fn parse(&self, raw: &str) -> ParsedOutput {
        let blocks: Vec<String> = self
            .block
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|body| !body.is_empty())
            .collect();

        if blocks.is_empty() && !self.block.is_match(raw) {
            return ParsedOutput {
                answer: raw.trim().to_string(),
                thinking: None,
            };
        }

        let answer = self.block.replace_all(raw, "").trim().to_string();
        ParsedOutput {
            answer,
            thinking: (!blocks.is_empty()).then(|| blocks.join("\n\n")),
        }
    }
}
