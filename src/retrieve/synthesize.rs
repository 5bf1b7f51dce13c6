// src/retrieve/synthesize.rs
//! Reshape retrieved items into short post-like messages for the summarizer.
//! Pure and deterministic: templates are cycled by index.

use serde::{Deserialize, Serialize};

use super::types::ContentItem;

/// Characters of item text embedded in each message.
pub const SNIPPET_BUDGET: usize = 100;
pub const ELLIPSIS: &str = "...";

const UNTITLED: &str = "this story";
const SOURCE_PLACEHOLDER: &str = "https://example.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub source: String,
}

/// Wrap up to `count` items in templated phrasings.
pub fn synthesize_messages(items: &[ContentItem], count: usize) -> Vec<Message> {
    items
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, item)| {
            let title = item.title.as_deref().unwrap_or(UNTITLED);
            let snippet = excerpt(&item.text);
            let source = if item.source.trim().is_empty() {
                SOURCE_PLACEHOLDER.to_string()
            } else {
                item.source.clone()
            };
            Message {
                id: format!("generated-{}", i + 1),
                text: render(i, title, &snippet),
                source,
            }
        })
        .collect()
}

/// First `SNIPPET_BUDGET` chars followed by the ellipsis.
pub fn excerpt(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_BUDGET).collect();
    format!("{head}{ELLIPSIS}")
}

fn render(index: usize, title: &str, snippet: &str) -> String {
    match index % 5 {
        0 => format!("Just read this about {title}: {snippet}"),
        1 => format!("Interesting perspective on {title}! {snippet}"),
        2 => format!("According to a reliable source: {snippet}"),
        3 => format!("Worth reading about {title}: {snippet}"),
        _ => format!("New information about {title}: {snippet}"),
    }
}
