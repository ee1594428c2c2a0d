//! Rule-based chunk categorisation.
//!
//! Rules are evaluated in table order and the first match wins, so the table
//! order is the precedence order.

use super::types::Category;

/// How much of the content is inspected for keywords.
const CONTENT_PREFIX_CHARS: usize = 500;

struct CategoryRule {
    category: Category,
    /// Matched against whole lower-cased URL path segments.
    path_segments: &'static [&'static str],
    /// Substrings of the lower-cased title.
    title_keywords: &'static [&'static str],
    /// Substrings of the lower-cased content prefix.
    content_keywords: &'static [&'static str],
}

const RULES: [CategoryRule; 5] = [
    CategoryRule {
        category: Category::Documentation,
        path_segments: &["docs", "doc", "documentation", "api", "reference", "guide", "guides"],
        title_keywords: &["documentation", "docs", "api reference", "developer guide"],
        content_keywords: &["api reference", "getting started", "installation guide"],
    },
    CategoryRule {
        category: Category::Article,
        path_segments: &["blog", "article", "articles", "news", "post", "posts"],
        title_keywords: &["blog", "article", "news"],
        content_keywords: &["published on", "posted by", "written by"],
    },
    CategoryRule {
        category: Category::Product,
        path_segments: &["product", "products", "shop", "store", "pricing"],
        title_keywords: &["product", "pricing"],
        content_keywords: &["add to cart", "buy now", "in stock"],
    },
    CategoryRule {
        category: Category::Faq,
        path_segments: &["faq", "faqs"],
        title_keywords: &["faq", "frequently asked"],
        content_keywords: &["frequently asked questions"],
    },
    CategoryRule {
        category: Category::Support,
        path_segments: &["support", "help", "contact"],
        title_keywords: &["support", "help", "contact"],
        content_keywords: &["contact us", "customer service", "support team"],
    },
];

pub fn classify(url: Option<&str>, title: &str, content: &str) -> Category {
    let segments = url.map(url_path_segments).unwrap_or_default();
    let title = title.to_lowercase();
    let content: String = content
        .chars()
        .take(CONTENT_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase();

    RULES
        .iter()
        .find(|rule| {
            segments
                .iter()
                .any(|segment| rule.path_segments.contains(&segment.as_str()))
                || rule.title_keywords.iter().any(|kw| title.contains(kw))
                || rule.content_keywords.iter().any(|kw| content.contains(kw))
        })
        .map(|rule| rule.category)
        .unwrap_or(Category::General)
}

fn url_path_segments(url: &str) -> Vec<String> {
    let lower = url.trim().to_lowercase();
    let without_scheme = lower
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&lower);
    let path = without_scheme
        .find('/')
        .map(|idx| &without_scheme[idx..])
        .unwrap_or("");
    let path = path.split(&['?', '#'][..]).next().unwrap_or("");

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_path_decides_category() {
        assert_eq!(
            classify(Some("https://example.com/docs/setup"), "Setup", "text"),
            Category::Documentation
        );
        assert_eq!(
            classify(Some("https://example.com/blog/2024/launch"), "Launch", "text"),
            Category::Article
        );
        assert_eq!(
            classify(Some("https://example.com/help?topic=login"), "Login", "text"),
            Category::Support
        );
    }

    #[test]
    fn host_names_are_not_path_segments() {
        assert_eq!(
            classify(Some("https://docs.example.com/"), "Welcome", "hello"),
            Category::General
        );
    }

    #[test]
    fn earlier_rules_take_precedence() {
        // Both faq and support keywords are present; faq comes first.
        assert_eq!(
            classify(None, "Support FAQ", "Contact us any time."),
            Category::Faq
        );
    }

    #[test]
    fn only_content_prefix_is_inspected() {
        let content = format!("{}add to cart", "x".repeat(600));
        assert_eq!(classify(None, "Untitled", &content), Category::General);
        assert_eq!(
            classify(None, "Untitled", "Item is in stock now"),
            Category::Product
        );
    }

    #[test]
    fn falls_back_to_general() {
        assert_eq!(classify(None, "Our story", "We started in a garage."), Category::General);
    }
}
