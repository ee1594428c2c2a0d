//! Casual-conversation detection.
//!
//! An ordered table of `(kind, pattern)` pairs matched against the trimmed,
//! lower-cased query. Anything that matches no row is a knowledge query.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasualKind {
    Greeting,
    Thanks,
    Farewell,
    Acknowledgment,
    Identity,
    /// Matched a pattern supplied through configuration.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Casual(CasualKind),
    Knowledge,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Casual(_) => "casual",
            QueryType::Knowledge => "knowledge",
        }
    }

    pub fn is_casual(&self) -> bool {
        matches!(self, QueryType::Casual(_))
    }
}

const BUILTIN_PATTERNS: [(CasualKind, &str); 5] = [
    (
        CasualKind::Greeting,
        r"^(hi|hello|hey|hiya|howdy|greetings|yo|good (morning|afternoon|evening|day))( there| everyone| all)?[\s!.,?]*$",
    ),
    (
        CasualKind::Thanks,
        r"^(thanks|thank you|thx|ty|many thanks|thanks a lot|thank you so much|much appreciated)( so much| very much)?[\s!.,?]*$",
    ),
    (
        CasualKind::Farewell,
        r"^(bye|goodbye|good bye|see you|see ya|later|take care|good night|farewell)( later| soon)?[\s!.,?]*$",
    ),
    (
        CasualKind::Acknowledgment,
        r"^(ok|okay|k|cool|great|nice|awesome|got it|i see|understood|alright|sure|perfect)[\s!.,?]*$",
    ),
    (
        CasualKind::Identity,
        r"^(who are you|what are you|what('s| is) your name|what can you do|how are you( doing)?|are you (a bot|an ai|human))[\s!.,?]*$",
    ),
];

pub struct QueryClassifier {
    table: Vec<(CasualKind, Regex)>,
}

impl QueryClassifier {
    /// Built-in rows followed by `extra` patterns, in that order.
    pub fn new(extra: &[String]) -> Result<Self, ApiError> {
        let mut table = Vec::with_capacity(BUILTIN_PATTERNS.len() + extra.len());
        for (kind, pattern) in BUILTIN_PATTERNS {
            table.push((kind, Regex::new(pattern).map_err(ApiError::internal)?));
        }
        for pattern in extra {
            let regex = Regex::new(pattern).map_err(|err| {
                ApiError::BadRequest(format!("invalid casual pattern '{}': {}", pattern, err))
            })?;
            table.push((CasualKind::Custom, regex));
        }
        Ok(Self { table })
    }

    pub fn classify(&self, query: &str) -> QueryType {
        let normalized = query.trim().to_lowercase();
        self.table
            .iter()
            .find(|(_, regex)| regex.is_match(&normalized))
            .map(|(kind, _)| QueryType::Casual(*kind))
            .unwrap_or(QueryType::Knowledge)
    }
}
