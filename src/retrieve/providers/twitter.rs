// src/retrieve/providers/twitter.rs
//! Twitter/X API v2 recent search. Primary source.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::retrieve::normalize::{clean_text, normalize_item};
use crate::retrieve::types::{ContentItem, ContentProvider};

pub const DEFAULT_ENDPOINT: &str = "https://api.twitter.com/2/tweets/search/recent";
const NAME: &str = "twitter";

// API accepts max_results in 10..=100.
const API_MIN_RESULTS: usize = 10;
const API_MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<Tweet>>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

pub struct TwitterProvider {
    client: Client,
    endpoint: String,
    bearer_token: String,
    multiplier: usize,
}

impl TwitterProvider {
    pub fn new(client: Client, bearer_token: &str) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bearer_token: bearer_token.to_string(),
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

    /// Size hint sent to the API.
    pub fn max_results(&self, desired: usize) -> usize {
        desired
            .saturating_mul(self.multiplier)
            .clamp(API_MIN_RESULTS, API_MAX_RESULTS)
    }

    /// Parse a search response. A response without `data` means "no tweets", not an error.
    pub fn parse_response(body: &str) -> Result<Vec<ContentItem>, ProviderError> {
        let resp: SearchResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::malformed(NAME, e))?;

        let tweets = resp.data.unwrap_or_default();
        let mut out = Vec::with_capacity(tweets.len());
        for tw in tweets {
            let id = tw.id.as_deref().map(str::trim).unwrap_or_default();
            let text = tw.text.as_deref().map(clean_text).unwrap_or_default();
            if id.is_empty() || text.is_empty() {
                continue;
            }
            let item = ContentItem {
                id: format!("{NAME}-{}", out.len() + 1),
                text,
                source: format!("https://twitter.com/i/web/status/{id}"),
                title: None,
            };
            if let Some(item) = normalize_item(item, None) {
                out.push(item);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl ContentProvider for TwitterProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let max_results = self.max_results(desired).to_string();
        let req = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,public_metrics"),
            ]);

        let body = super::send_for_text(NAME, req).await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
