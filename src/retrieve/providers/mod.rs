// src/retrieve/providers/mod.rs
pub mod bing;
pub mod duckduckgo;
pub mod news;
pub mod reddit;
pub mod serper;
pub mod synthetic;
pub mod twitter;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{RetrievalConfig, Secrets};
use crate::error::ProviderError;
use crate::retrieve::types::ContentProvider;

/// Desktop browser UA; several engines serve a stripped page to unknown agents.
pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Names accepted in `[retrieval] providers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Twitter,
    Serper,
    DuckDuckGo,
    Bing,
    News,
    Reddit,
}

impl ProviderKind {
    pub fn default_chain() -> Vec<ProviderKind> {
        vec![
            ProviderKind::Twitter,
            ProviderKind::Serper,
            ProviderKind::DuckDuckGo,
            ProviderKind::Bing,
            ProviderKind::News,
            ProviderKind::Reddit,
        ]
    }
}

/// Shared outbound client. Every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("topic-digest/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout.min(Duration::from_secs(4)))
        .timeout(timeout)
        .build()
        .context("building reqwest client")
}

/// Build the ordered provider chain. Providers missing their credential are skipped.
pub fn build_chain(
    cfg: &RetrievalConfig,
    secrets: &Secrets,
    client: &Client,
) -> Vec<Arc<dyn ContentProvider>> {
    let multiplier = cfg.request_multiplier.max(1);
    let mut chain: Vec<Arc<dyn ContentProvider>> = Vec::with_capacity(cfg.providers.len());

    for kind in &cfg.providers {
        match kind {
            ProviderKind::Twitter => match secrets.twitter_bearer_token.as_deref() {
                Some(token) => chain.push(Arc::new(
                    twitter::TwitterProvider::new(client.clone(), token)
                        .with_multiplier(multiplier),
                )),
                None => warn!(provider = "twitter", "no bearer token configured; skipping"),
            },
            ProviderKind::Serper => match secrets.serper_api_key.as_deref() {
                Some(key) => chain.push(Arc::new(
                    serper::SerperProvider::new(client.clone(), key).with_multiplier(multiplier),
                )),
                None => warn!(provider = "serper", "no API key configured; skipping"),
            },
            ProviderKind::DuckDuckGo => chain.push(Arc::new(
                duckduckgo::DuckDuckGoProvider::new(client.clone()).with_multiplier(multiplier),
            )),
            ProviderKind::Bing => chain.push(Arc::new(
                bing::BingProvider::new(client.clone()).with_multiplier(multiplier),
            )),
            ProviderKind::News => chain.push(Arc::new(
                news::NewsProvider::new(client.clone()).with_multiplier(multiplier),
            )),
            ProviderKind::Reddit => chain.push(Arc::new(
                reddit::RedditProvider::new(client.clone()).with_multiplier(multiplier),
            )),
        }
    }
    chain
}

/// Attach browser-like headers to a scrape request.
pub(crate) fn browser_get(client: &Client, url: &str) -> RequestBuilder {
    client
        .get(url)
        .header(USER_AGENT, BROWSER_UA)
        .header(ACCEPT, BROWSER_ACCEPT)
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
}

/// Send and read the body; transport errors and non-2xx become `Unavailable`.
pub(crate) async fn send_for_text(
    provider: &'static str,
    req: RequestBuilder,
) -> Result<String, ProviderError> {
    let resp = req
        .send()
        .await
        .map_err(|e| ProviderError::unavailable(provider, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::unavailable(provider, format!("HTTP {status}")));
    }
    resp.text()
        .await
        .map_err(|e| ProviderError::unavailable(provider, e))
}

/// Compile a selector known at build time.
pub(crate) fn css(s: &'static str) -> Selector {
    Selector::parse(s).unwrap_or_else(|e| panic!("invalid static selector {s:?}: {e}"))
}

/// Concatenated text of the first descendant matching `sel`.
pub(crate) fn first_text(el: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|e| e.text().collect::<String>())
}

/// Attribute of the first descendant matching `sel`.
pub(crate) fn first_attr(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
}

pub(crate) static ANCHOR: Lazy<Selector> = Lazy::new(|| css("a"));
