// src/retrieve/providers/reddit.rs
//! old.reddit.com search scrape (the legacy layout is static HTML).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::{browser_get, css, first_attr, first_text, send_for_text};
use crate::error::ProviderError;
use crate::retrieve::normalize::{normalize_record, RawRecord};
use crate::retrieve::types::{ContentItem, ContentProvider};

pub const DEFAULT_ENDPOINT: &str = "https://old.reddit.com/search/";
const NAME: &str = "reddit";

static RESULT: Lazy<Selector> = Lazy::new(|| css(".search-result"));
static TITLE: Lazy<Selector> = Lazy::new(|| css(".search-title"));
static BODY: Lazy<Selector> = Lazy::new(|| css(".search-result-body"));
static BASE: Lazy<Url> = Lazy::new(|| Url::parse("https://www.reddit.com/").expect("static url"));

pub struct RedditProvider {
    client: Client,
    endpoint: String,
    multiplier: usize,
}

impl RedditProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
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

    /// Posts without a self-text body are skipped (link-only posts carry no snippet).
    pub fn parse_results(html: &str, limit: usize) -> Vec<ContentItem> {
        let doc = Html::parse_document(html);
        let mut out = Vec::new();

        for el in doc.select(&RESULT) {
            if out.len() >= limit {
                break;
            }
            let raw = RawRecord {
                title: first_text(&el, &TITLE),
                snippet: first_text(&el, &BODY),
                link: first_attr(&el, &TITLE, "href"),
            };
            if let Some(item) = normalize_record(NAME, out.len() + 1, raw, Some(&BASE)) {
                out.push(item);
            }
        }
        out
    }
}

#[async_trait]
impl ContentProvider for RedditProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let limit = desired.saturating_mul(self.multiplier);
        let req = browser_get(&self.client, &self.endpoint).query(&[("q", query)]);

        let body = send_for_text(NAME, req).await?;
        Ok(Self::parse_results(&body, limit))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
