// src/retrieve/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One retrieved snippet about a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,     // e.g. "bing-7", unique within one retrieval call
    pub text: String,   // "<title>. <snippet>" or raw post text
    pub source: String, // absolute URL or synthetic identifier; dedup key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ContentItem {
    /// Text and source must be non-blank; a title, when set, must be non-blank too.
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty()
            && !self.source.trim().is_empty()
            && self.title.as_deref().map_or(true, |t| !t.trim().is_empty())
    }
}

/// A single content source behind the uniform fetch contract.
///
/// Implementations bound their own network calls with a timeout and translate
/// every failure into a `ProviderError`; they never panic on bad payloads.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch up to roughly `desired` items (adapters may over-request) for `query`.
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError>;

    /// Short stable name; also used as the id prefix.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, source: &str, title: Option<&str>) -> ContentItem {
        ContentItem {
            id: "t-1".into(),
            text: text.into(),
            source: source.into(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn validity_rules() {
        assert!(item("a. b", "https://x.test/1", Some("a")).is_valid());
        assert!(item("tweet body", "https://x.test/1", None).is_valid());
        assert!(!item("   ", "https://x.test/1", None).is_valid());
        assert!(!item("a. b", "", None).is_valid());
        assert!(!item("a. b", "https://x.test/1", Some("  ")).is_valid());
    }

    #[test]
    fn title_is_omitted_from_json_when_absent() {
        let json = serde_json::to_string(&item("x", "https://x.test", None)).unwrap();
        assert!(!json.contains("title"));
    }
}
