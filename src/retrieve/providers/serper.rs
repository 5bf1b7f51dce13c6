// src/retrieve/providers/serper.rs
//! Serper.dev Google search API. Secondary source.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::retrieve::normalize::{normalize_record, RawRecord};
use crate::retrieve::types::{ContentItem, ContentProvider};

pub const DEFAULT_ENDPOINT: &str = "https://google.serper.dev/search";
const NAME: &str = "serper";
const API_MAX_RESULTS: usize = 100;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<Organic>,
}

#[derive(Debug, Deserialize)]
struct Organic {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

pub struct SerperProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    multiplier: usize,
}

impl SerperProvider {
    pub fn new(client: Client, api_key: &str) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            multiplier: 2,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_multiplier(mut self, multiplier: usize) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }

    pub fn parse_response(body: &str) -> Result<Vec<ContentItem>, ProviderError> {
        let resp: SearchResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::malformed(NAME, e))?;

        let mut out = Vec::with_capacity(resp.organic.len());
        for o in resp.organic {
            let raw = RawRecord {
                title: o.title,
                snippet: o.snippet,
                link: o.link,
            };
            if let Some(item) = normalize_record(NAME, out.len() + 1, raw, None) {
                out.push(item);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl ContentProvider for SerperProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let num = desired.saturating_mul(self.multiplier).min(API_MAX_RESULTS);
        let req = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest { q: query, num });

        let body = super::send_for_text(NAME, req).await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organic_results_become_items() {
        let body = r#"{
            "searchParameters": {"q": "rust"},
            "organic": [
                {"title": "Rust 1.80", "link": "https://blog.rust-lang.org/1.80", "snippet": "Released today.", "position": 1},
                {"title": "No link", "snippet": "dropped"},
                {"title": "", "link": "https://x.test", "snippet": "dropped"}
            ]
        }"#;
        let items = SerperProvider::parse_response(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "serper-1");
        assert_eq!(items[0].text, "Rust 1.80. Released today.");
    }

    #[test]
    fn relative_link_without_base_is_dropped() {
        let body = r#"{"organic":[{"title":"T","link":"/rel","snippet":"S"}]}"#;
        assert!(SerperProvider::parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            SerperProvider::parse_response("oops"),
            Err(ProviderError::Malformed { provider: "serper", .. })
        ));
    }
}
