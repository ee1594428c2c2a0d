//! Document chunking.
//!
//! Splits a document into overlapping character windows, preferring to end a
//! window on a sentence boundary, and derives stable ids and content hashes.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use super::category::classify;
use super::types::{Chunk, Document};
use crate::core::config::ChunkingConfig;

/// Hex chars of the source digest used in chunk ids.
const STABLE_ID_LEN: usize = 16;

/// A window over the trimmed document text, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextSpan {
    pub start: usize,
    pub end: usize,
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk a document. Documents shorter than `min_content_length` yield
    /// nothing.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.content.trim();
        let chars: Vec<char> = text.chars().collect();

        if chars.len() < self.config.min_content_length {
            tracing::debug!(
                "Skipping '{}': content too short ({} < {} chars)",
                document.title,
                chars.len(),
                self.config.min_content_length
            );
            return Vec::new();
        }

        let pieces: Vec<String> = self
            .split_spans(&chars)
            .into_iter()
            .map(|span| chars[span.start..span.end].iter().collect::<String>())
            .map(|piece| piece.trim().to_string())
            .filter(|piece| {
                !piece.is_empty() && piece.chars().count() >= self.config.min_content_length
            })
            .collect();

        let total = pieces.len();
        let source_id = stable_id(document.source_key());

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let title = format!("{} (Part {}/{})", document.title, index + 1, total);
                Chunk {
                    id: format!("{}-chunk-{}", source_id, index),
                    category: classify(document.url.as_deref(), &title, &content),
                    content_hash: content_hash(&content),
                    title,
                    content,
                    url: document.url.clone(),
                    description: if index == 0 {
                        document.description.clone()
                    } else {
                        None
                    },
                    chunk_index: index,
                    total_chunks: total,
                    scraped_at: document.scraped_at.clone(),
                }
            })
            .collect()
    }

    /// Window layout over `chars`. Consecutive spans overlap or touch, the
    /// first starts at 0 and the last ends at `chars.len()` unless the loop
    /// had to stop on a non-advancing window.
    pub(crate) fn split_spans(&self, chars: &[char]) -> Vec<TextSpan> {
        let total = chars.len();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap;

        if total <= size {
            return vec![TextSpan { start: 0, end: total }];
        }

        let mut spans = Vec::new();
        let mut start = 0;

        while start < total {
            let raw_end = (start + size).min(total);
            let mut end = raw_end;

            if raw_end < total {
                if let Some(cut) = find_sentence_boundary(&chars[start..raw_end]) {
                    end = start + cut;
                }
                // A shrunken window that cannot advance falls back to the raw edge.
                if end.saturating_sub(overlap) <= start {
                    end = raw_end;
                }
            }

            spans.push(TextSpan { start, end });

            if end >= total {
                break;
            }

            let next = end.saturating_sub(overlap);
            if next <= start {
                tracing::warn!(
                    "Chunk window stopped advancing at offset {} (size {}, overlap {})",
                    start,
                    size,
                    overlap
                );
                break;
            }
            start = next;
        }

        spans
    }
}

/// Drops chunks whose content hash was already seen, first occurrence wins.
/// Scope is whatever sequence is passed in; the store is not consulted.
pub fn deduplicate(chunks: Vec<Chunk>) -> Vec<Chunk> {
    retain_unseen(chunks, &HashSet::new())
}

/// Like [`deduplicate`], also dropping hashes already in `seen`. `seen` is
/// left untouched so callers can record hashes once the chunks are stored.
pub fn retain_unseen(chunks: Vec<Chunk>, seen: &HashSet<String>) -> Vec<Chunk> {
    let mut local = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| {
            let fresh = !seen.contains(&chunk.content_hash)
                && local.insert(chunk.content_hash.clone());
            if !fresh {
                tracing::debug!("Dropping duplicate chunk {}", chunk.id);
            }
            fresh
        })
        .collect()
}

/// SHA-256 hex digest of the trimmed text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.trim().as_bytes()))
}

/// Deterministic short identifier for a source key.
pub fn stable_id(key: &str) -> String {
    let digest = hex::encode(Sha256::digest(key.trim().as_bytes()));
    digest[..STABLE_ID_LEN].to_string()
}

/// Returns the cut position (exclusive, relative to `window`) just after the
/// last `. `, `! `, `? ` or newline past the window midpoint.
fn find_sentence_boundary(window: &[char]) -> Option<usize> {
    let half = window.len() / 2;

    (half + 1..window.len()).rev().find_map(|idx| {
        let ch = window[idx];
        let sentence_end =
            matches!(ch, '.' | '!' | '?') && window.get(idx + 1) == Some(&' ');
        if ch == '\n' || sentence_end {
            Some(idx + 1)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_content_length: 50,
        })
    }

    fn long_text() -> String {
        (0..60)
            .map(|i| format!("Sentence number {} talks about returns and refunds.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_documents_yield_nothing() {
        let doc = Document::new("Tiny", "Too short to index.");
        assert!(chunker(800, 200).chunk(&doc).is_empty());

        let padded = Document::new("Tiny", format!("   {}   ", "a".repeat(49)));
        assert!(chunker(800, 200).chunk(&padded).is_empty());
    }

    #[test]
    fn document_within_chunk_size_is_one_trimmed_chunk() {
        let body = "Our return policy allows returns within 30 days of delivery for a full refund.";
        let doc = Document::new("Return Policy", format!("\n  {}  \n", body))
            .with_url("https://shop.example.com/policies/returns");

        let chunks = chunker(800, 200).chunk(&doc);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, body);
        assert_eq!(chunks[0].title, "Return Policy (Part 1/1)");
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].content_hash, content_hash(body));
    }

    #[test]
    fn spans_cover_text_in_order() {
        let text = long_text();
        let chars: Vec<char> = text.chars().collect();
        let spans = chunker(300, 80).split_spans(&chars);

        assert!(spans.len() > 2);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans.last().unwrap().end, chars.len());
        for pair in spans.windows(2) {
            assert!(pair[1].start > pair[0].start, "windows must advance");
            assert!(pair[1].start <= pair[0].end, "no gap between windows");
        }

        // Stitching the non-overlapping parts reproduces the text exactly.
        let mut rebuilt = String::new();
        let mut covered = 0;
        for span in &spans {
            rebuilt.extend(&chars[covered.max(span.start)..span.end]);
            covered = span.end;
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn windows_prefer_sentence_boundaries() {
        let text = long_text();
        let chunks = chunker(300, 80).chunk(&Document::new("Policy", text));

        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.content.ends_with('.'), "got {:?}", chunk.content);
            assert!(chunk.content.chars().count() > 150);
        }
    }

    #[test]
    fn boundary_before_midpoint_is_ignored() {
        let mut text = String::from("Short one. ");
        text.push_str(&"x".repeat(400));
        let chars: Vec<char> = text.chars().collect();

        let spans = chunker(200, 50).split_spans(&chars);
        assert_eq!(spans[0], TextSpan { start: 0, end: 200 });
        assert_eq!(spans[1].start, 150);
    }

    #[test]
    fn ids_titles_and_description_follow_source() {
        let mut doc = Document::new("Shipping Guide", long_text())
            .with_url("https://example.com/help/shipping");
        doc.description = Some("How we ship".to_string());

        let first = chunker(300, 80).chunk(&doc);
        let second = chunker(300, 80).chunk(&doc);
        let total = first.len();

        assert_eq!(first, second, "re-chunking is deterministic");
        let prefix = stable_id("https://example.com/help/shipping");
        for (i, chunk) in first.iter().enumerate() {
            assert_eq!(chunk.id, format!("{}-chunk-{}", prefix, i));
            assert_eq!(chunk.title, format!("Shipping Guide (Part {}/{})", i + 1, total));
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.total_chunks, total);
        }
        assert_eq!(first[0].description.as_deref(), Some("How we ship"));
        assert!(first[1..].iter().all(|c| c.description.is_none()));
    }

    #[test]
    fn deduplicate_keeps_first_occurrence() {
        let body = "Identical paragraph that appears on two different pages of the site.";
        let a = chunker(800, 200).chunk(&Document::new("A", body).with_url("https://a.example/x"));
        let b = chunker(800, 200).chunk(&Document::new("B", body).with_url("https://b.example/y"));
        assert_ne!(a[0].id, b[0].id);

        let kept = deduplicate(a.into_iter().chain(b.clone()).collect());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "A (Part 1/1)");

        let mut seen = HashSet::new();
        seen.insert(b[0].content_hash.clone());
        assert!(retain_unseen(b, &seen).is_empty());
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn stops_when_window_cannot_advance() {
        let chars: Vec<char> = "y".repeat(50).chars().collect();
        let stalled = Chunker::new(ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            min_content_length: 1,
        });
        let spans = stalled.split_spans(&chars);
        assert_eq!(spans, vec![TextSpan { start: 0, end: 10 }]);
    }
}
