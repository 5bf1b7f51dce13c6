// src/retrieve/providers/news.rs
//! News sites: Google News RSS search, Reuters and BBC search pages.
//! Sites are tried in order until enough items are collected; one site failing
//! does not fail the adapter unless every site fails.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{browser_get, css, first_attr, first_text, send_for_text, ANCHOR};
use crate::error::ProviderError;
use crate::retrieve::normalize::{normalize_record, RawRecord};
use crate::retrieve::types::{ContentItem, ContentProvider};

const NAME: &str = "news";

pub const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";
pub const REUTERS_SEARCH: &str = "https://www.reuters.com/search/news";
pub const BBC_SEARCH: &str = "https://www.bbc.com/search";

static REUTERS_RESULT: Lazy<Selector> = Lazy::new(|| css(".search-result-content"));
static BBC_RESULT: Lazy<Selector> = Lazy::new(|| css(".ssrcss-1f3bvyz-Stack"));
static H2: Lazy<Selector> = Lazy::new(|| css("h2"));
static H3: Lazy<Selector> = Lazy::new(|| css("h3"));
static P: Lazy<Selector> = Lazy::new(|| css("p"));

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    GoogleNewsRss,
    Reuters,
    Bbc,
}

impl SiteKind {
    fn origin(self) -> &'static str {
        match self {
            SiteKind::GoogleNewsRss => "https://news.google.com/",
            SiteKind::Reuters => "https://www.reuters.com/",
            SiteKind::Bbc => "https://www.bbc.com/",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SiteKind::GoogleNewsRss => "google-news",
            SiteKind::Reuters => "reuters",
            SiteKind::Bbc => "bbc",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsSite {
    pub kind: SiteKind,
    pub endpoint: String,
}

impl NewsSite {
    pub fn new(kind: SiteKind, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
        }
    }

    pub fn defaults() -> Vec<NewsSite> {
        vec![
            NewsSite::new(SiteKind::GoogleNewsRss, GOOGLE_NEWS_RSS),
            NewsSite::new(SiteKind::Reuters, REUTERS_SEARCH),
            NewsSite::new(SiteKind::Bbc, BBC_SEARCH),
        ]
    }

    /// Base used to resolve relative links (always the public origin, not the endpoint).
    fn base(&self) -> Option<Url> {
        Url::parse(self.kind.origin()).ok()
    }

    fn request(&self, client: &Client, query: &str) -> reqwest::RequestBuilder {
        let req = browser_get(client, &self.endpoint);
        match self.kind {
            SiteKind::GoogleNewsRss => {
                req.query(&[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")])
            }
            SiteKind::Reuters => req.query(&[("blob", query)]),
            SiteKind::Bbc => req.query(&[("q", query)]),
        }
    }

    /// Raw records in page order.
    pub fn parse(&self, body: &str) -> Result<Vec<RawRecord>, ProviderError> {
        match self.kind {
            SiteKind::GoogleNewsRss => parse_rss(body),
            SiteKind::Reuters => Ok(parse_html(body, &REUTERS_RESULT, &H3)),
            SiteKind::Bbc => Ok(parse_html(body, &BBC_RESULT, &H2)),
        }
    }
}

pub fn parse_rss(xml: &str) -> Result<Vec<RawRecord>, ProviderError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| ProviderError::malformed(NAME, e))?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| RawRecord {
            title: it.title,
            snippet: it.description,
            link: it.link,
        })
        .collect())
}

fn parse_html(html: &str, block: &Selector, heading: &Selector) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    doc.select(block)
        .map(|el| RawRecord {
            title: first_text(&el, heading),
            snippet: first_text(&el, &P),
            link: first_attr(&el, &ANCHOR, "href"),
        })
        .collect()
}

pub struct NewsProvider {
    client: Client,
    sites: Vec<NewsSite>,
    multiplier: usize,
}

impl NewsProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            sites: NewsSite::defaults(),
            multiplier: 2,
        }
    }

    pub fn with_sites(mut self, sites: Vec<NewsSite>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_multiplier(mut self, multiplier: usize) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }
}

#[async_trait]
impl ContentProvider for NewsProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        let limit = desired.saturating_mul(self.multiplier);
        let mut out: Vec<ContentItem> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut failures = 0usize;

        for site in &self.sites {
            if out.len() >= limit {
                break;
            }
            let records = match send_for_text(NAME, site.request(&self.client, query)).await {
                Ok(body) => site.parse(&body),
                Err(e) => Err(e),
            };
            let records = match records {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        provider = NAME,
                        site = site.kind.label(),
                        error = %e,
                        "news site failed"
                    );
                    failures += 1;
                    continue;
                }
            };

            let base = site.base();
            for raw in records {
                if out.len() >= limit {
                    break;
                }
                if let Some(item) = normalize_record(NAME, out.len() + 1, raw, base.as_ref()) {
                    if seen.insert(item.source.clone()) {
                        out.push(item);
                    }
                }
            }
            debug!(
                provider = NAME,
                site = site.kind.label(),
                total = out.len(),
                limit,
                "news site scraped"
            );
        }

        if failures > 0 && failures == self.sites.len() {
            return Err(ProviderError::unavailable(NAME, "every news site failed"));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
