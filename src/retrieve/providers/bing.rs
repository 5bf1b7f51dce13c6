// src/retrieve/providers/bing.rs
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::{browser_get, css, first_attr, first_text, send_for_text};
use crate::error::ProviderError;
use crate::retrieve::normalize::{normalize_record, RawRecord};
use crate::retrieve::types::{ContentItem, ContentProvider};

pub const DEFAULT_ENDPOINT: &str = "https://www.bing.com/search";
const NAME: &str = "bing";

static RESULT: Lazy<Selector> = Lazy::new(|| css(".b_algo"));
static TITLE: Lazy<Selector> = Lazy::new(|| css("h2"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| css("h2 a"));
static SNIPPET: Lazy<Selector> = Lazy::new(|| css(".b_caption p"));
static BASE: Lazy<Url> = Lazy::new(|| Url::parse("https://www.bing.com/").expect("static url"));

pub struct BingProvider {
    client: Client,
    endpoint: String,
    multiplier: usize,
}

impl BingProvider {
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

    pub fn parse_results(html: &str, limit: usize) -> Vec<ContentItem> {
        let doc = Html::parse_document(html);
        let mut out = Vec::new();

        for el in doc.select(&RESULT).take(limit) {
            let raw = RawRecord {
                title: first_text(&el, &TITLE),
                snippet: first_text(&el, &SNIPPET),
                link: first_attr(&el, &TITLE_LINK, "href"),
            };
            if let Some(item) = normalize_record(NAME, out.len() + 1, raw, Some(&BASE)) {
                out.push(item);
            }
        }
        out
    }
}

#[async_trait]
impl ContentProvider for BingProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let count = desired.saturating_mul(self.multiplier);
        let req = browser_get(&self.client, &self.endpoint)
            .query(&[("q", query), ("count", count.to_string().as_str())]);

        let body = send_for_text(NAME, req).await?;
        Ok(Self::parse_results(&body, count))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
