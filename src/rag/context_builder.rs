//! Prompt assembly for grounded generation.

use super::types::SearchResult;
use crate::llm::ChatMessage;

/// System instruction for answers grounded in retrieved documents.
pub const RAG_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions using \
the provided context documents. Base your answer on the context. If the context does not \
contain enough information to answer the question, say so clearly instead of guessing. \
Be concise and refer to the documents by title when useful.";

/// Renders results as numbered `[Document i: title]` sections separated by
/// blank lines.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            format!(
                "[Document {}: {}]\n{}",
                idx + 1,
                result.chunk.title,
                result.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System prompt plus a user turn carrying the context and the question.
pub fn build_rag_messages(query: &str, results: &[SearchResult]) -> Vec<ChatMessage> {
    let user = format!(
        "Context:\n{}\n\nQuestion: {}",
        build_context(results),
        query
    );
    vec![ChatMessage::system(RAG_SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::types::{Category, Chunk};

    fn result(title: &str, content: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: title.to_lowercase(),
                title: title.to_string(),
                content: content.to_string(),
                url: None,
                description: None,
                chunk_index: 0,
                total_chunks: 1,
                category: Category::General,
                content_hash: String::new(),
                scraped_at: None,
            },
            score: 0.8,
        }
    }

    #[test]
    fn numbers_documents_in_rank_order() {
        let context = build_context(&[
            result("Returns", "Within 30 days."),
            result("Shipping", "Five days."),
        ]);
        assert_eq!(
            context,
            "[Document 1: Returns]\nWithin 30 days.\n\n[Document 2: Shipping]\nFive days."
        );
    }

    #[test]
    fn rag_messages_carry_instruction_context_and_question() {
        let messages = build_rag_messages("Can I return shoes?", &[result("Returns", "Yes.")]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("say so clearly"));
        assert_eq!(
            messages[1].content,
            "Context:\n[Document 1: Returns]\nYes.\n\nQuestion: Can I return shoes?"
        );
    }
}
