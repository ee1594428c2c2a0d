//! Web content source used by URL ingestion.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::StatusCode;

use crate::core::config::ScraperConfig;
use crate::core::errors::ApiError;
use crate::rag::types::Document;

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document, ApiError>;
}

pub struct HttpContentSource {
    client: reqwest::Client,
    config: ScraperConfig,
    extractor: HtmlExtractor,
}

impl HttpContentSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            config: config.clone(),
            extractor: HtmlExtractor::new()?,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.config.backoff_base_ms.saturating_mul(factor))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ApiError> {
        let mut attempt = 0;
        loop {
            let outcome = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.map_err(ApiError::upstream);
                }
                Ok(response) if is_retryable_status(response.status()) => Err(ApiError::Upstream(
                    format!("{} responded {}", url, response.status()),
                )),
                Ok(response) => {
                    return Err(ApiError::Upstream(format!(
                        "{} responded {}",
                        url,
                        response.status()
                    )))
                }
                Err(err) => Err(ApiError::upstream(err)),
            };

            if attempt >= self.config.max_retries {
                return outcome;
            }
            if let Err(err) = outcome {
                let delay = self.backoff(attempt);
                tracing::warn!(
                    "Fetch of {} failed (attempt {}/{}): {}; retrying in {:?}",
                    url,
                    attempt + 1,
                    self.config.max_retries + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self, url: &str) -> Result<Document, ApiError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::BadRequest(format!("unsupported url: {}", url)));
        }

        let html = self.fetch_html(url).await?;
        let mut document = self.extractor.extract(&html, url);
        document.scraped_at = Some(Utc::now().to_rfc3339());
        tracing::info!(
            "Fetched '{}' from {} ({} chars)",
            document.title,
            url,
            document.content.chars().count()
        );
        Ok(document)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Pulls title, meta description and readable text out of an HTML page.
pub(crate) struct HtmlExtractor {
    title: Regex,
    meta_description: Regex,
    meta_content: Regex,
    hidden_blocks: Regex,
    tags: Regex,
    spaces: Regex,
}

impl HtmlExtractor {
    pub(crate) fn new() -> Result<Self, ApiError> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(ApiError::internal);
        Ok(Self {
            title: compile(r"(?is)<title[^>]*>(.*?)</title>")?,
            meta_description: compile(
                r#"(?is)<meta\s[^>]*name\s*=\s*["']description["'][^>]*>"#,
            )?,
            meta_content: compile(r#"(?is)content\s*=\s*["']([^"']*)["']"#)?,
            hidden_blocks: compile(
                r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<!--.*?-->",
            )?,
            tags: compile(r"(?s)<[^>]*>")?,
            spaces: compile(r"[ \t\u{a0}]+")?,
        })
    }

    pub(crate) fn extract(&self, html: &str, url: &str) -> Document {
        let title = self
            .title
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| self.clean_inline(m.as_str()))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| url.to_string());

        let description = self
            .meta_description
            .find(html)
            .and_then(|tag| self.meta_content.captures(tag.as_str()))
            .and_then(|caps| caps.get(1))
            .map(|m| self.clean_inline(m.as_str()))
            .filter(|desc| !desc.is_empty());

        let mut document = Document::new(title, self.visible_text(html)).with_url(url);
        document.description = description;
        document
    }

    fn visible_text(&self, html: &str) -> String {
        let without_hidden = self.hidden_blocks.replace_all(html, " ");
        // drop the head so the title is not repeated in the body text
        let body = match without_hidden.to_lowercase().find("</head>") {
            Some(idx) if without_hidden.is_char_boundary(idx + 7) => {
                without_hidden[idx + 7..].to_string()
            }
            _ => without_hidden.into_owned(),
        };
        let text = self.tags.replace_all(&body, "\n");

        decode_entities(&text)
            .lines()
            .map(|line| self.spaces.replace_all(line.trim(), " ").into_owned())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn clean_inline(&self, fragment: &str) -> String {
        let text = decode_entities(&self.tags.replace_all(fragment, " "));
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Returns &amp; Refunds</title>
  <meta name="description" content="How to send items back">
  <style>body { color: red; }</style>
</head>
<body>
  <script>var tracking = "<p>not text</p>";</script>
  <h1>Return Policy</h1>
  <p>You can return   items within <b>30 days</b>.</p>
  <!-- hidden note -->
</body>
</html>"#;

    #[test]
    fn extracts_title_description_and_text() {
        let extractor = HtmlExtractor::new().unwrap();
        let doc = extractor.extract(PAGE, "https://shop.example.com/returns");

        assert_eq!(doc.title, "Returns & Refunds");
        assert_eq!(doc.description.as_deref(), Some("How to send items back"));
        assert_eq!(doc.url.as_deref(), Some("https://shop.example.com/returns"));
        assert!(doc.content.contains("Return Policy"));
        assert!(doc.content.contains("You can return items within"));
        assert!(doc.content.contains("30 days"));
        assert!(!doc.content.contains("tracking"));
        assert!(!doc.content.contains("color: red"));
        assert!(!doc.content.contains("hidden note"));
    }

    #[test]
    fn falls_back_to_url_for_missing_title() {
        let extractor = HtmlExtractor::new().unwrap();
        let doc = extractor.extract("<p>Body only</p>", "https://example.com/x");
        assert_eq!(doc.title, "https://example.com/x");
        assert!(doc.description.is_none());
        assert_eq!(doc.content, "Body only");
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let source = HttpContentSource::new(&ScraperConfig {
            backoff_base_ms: 100,
            ..ScraperConfig::default()
        })
        .unwrap();
        assert_eq!(source.backoff(0), Duration::from_millis(100));
        assert_eq!(source.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn retries_only_transient_statuses() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let source = HttpContentSource::new(&ScraperConfig::default()).unwrap();
        assert!(matches!(
            source.fetch("file:///etc/passwd").await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
