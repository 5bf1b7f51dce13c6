// src/retrieve/providers/duckduckgo.rs
//! DuckDuckGo HTML endpoint scrape; result links are unwrapped from `/l/?uddg=` redirects.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::REFERER;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::{browser_get, css, first_attr, first_text, send_for_text};
use crate::error::ProviderError;
use crate::retrieve::normalize::{normalize_record, RawRecord};
use crate::retrieve::types::{ContentItem, ContentProvider};

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const NAME: &str = "duckduckgo";

static RESULT: Lazy<Selector> = Lazy::new(|| css(".result"));
static TITLE: Lazy<Selector> = Lazy::new(|| css(".result__title"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| css(".result__title a"));
static URL: Lazy<Selector> = Lazy::new(|| css(".result__url"));
static SNIPPET: Lazy<Selector> = Lazy::new(|| css(".result__snippet"));
static BASE: Lazy<Url> = Lazy::new(|| Url::parse("https://duckduckgo.com/").expect("static url"));

pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
    multiplier: usize,
}

impl DuckDuckGoProvider {
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

    /// Parse a results page; only the first `limit` result blocks are considered.
    pub fn parse_results(html: &str, limit: usize) -> Vec<ContentItem> {
        let doc = Html::parse_document(html);
        let mut out = Vec::new();

        for el in doc.select(&RESULT).take(limit) {
            let link = first_attr(&el, &URL, "href")
                .or_else(|| first_attr(&el, &TITLE_LINK, "href"));
            let raw = RawRecord {
                title: first_text(&el, &TITLE),
                snippet: first_text(&el, &SNIPPET),
                link: link.map(|l| unwrap_redirect(&l)),
            };
            if let Some(item) = normalize_record(NAME, out.len() + 1, raw, Some(&BASE)) {
                out.push(item);
            }
        }
        out
    }
}

/// `//duckduckgo.com/l/?uddg=<encoded target>&rut=...` → target URL.
/// Anything else is returned unchanged.
pub fn unwrap_redirect(link: &str) -> String {
    let Ok(u) = BASE.join(link.trim()) else {
        return link.to_string();
    };
    let is_ddg = u
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if is_ddg && u.path() == "/l/" {
        if let Some((_, target)) = u.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    link.to_string()
}

#[async_trait]
impl ContentProvider for DuckDuckGoProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let limit = desired.saturating_mul(self.multiplier);
        let req = browser_get(&self.client, &self.endpoint)
            .header(REFERER, "https://duckduckgo.com/")
            .query(&[("q", query)]);

        let body = send_for_text(NAME, req).await?;
        Ok(Self::parse_results(&body, limit))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
