use serde::{Deserialize, Serialize};

/// Raw ingestion input. Never stored; only its chunks persist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scraped_at: Option<String>,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Key the chunk ids are derived from: the URL when present, else the title.
    pub fn source_key(&self) -> &str {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Documentation,
    Article,
    Product,
    Faq,
    Support,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Documentation => "documentation",
            Category::Article => "article",
            Category::Product => "product",
            Category::Faq => "faq",
            Category::Support => "support",
            Category::General => "general",
        }
    }
}

/// The persisted retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub category: Category,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,
}

impl Chunk {
    /// Identity of the document this chunk was cut from: the id without its
    /// `-chunk-<index>` suffix.
    pub fn source_id(&self) -> &str {
        self.id
            .rsplit_once("-chunk-")
            .map(|(source, _)| source)
            .unwrap_or(&self.id)
    }

    /// Text sent to the embedding model.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.title, self.content)
    }
}

/// A similarity hit. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
