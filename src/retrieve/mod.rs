// src/retrieve/mod.rs
//! Multi-source content retrieval with ordered fallback.
//!
//! `Retriever::retrieve` walks the configured providers in priority order. Each
//! provider is queried with the topic and, while the target is not met, with a
//! fixed list of query variations. A provider that answers `Unavailable` is
//! dropped for the rest of the call. Results are merged into a per-call
//! accumulator that drops duplicate sources. If the real providers come up
//! short, the synthetic generator fills the remainder.

pub mod normalize;
pub mod providers;
pub mod synthesize;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{default_variations, AppConfig};
use crate::error::{ProviderError, RetrievalError};
use providers::synthetic::SyntheticProvider;
use types::{ContentItem, ContentProvider};

pub const MIN_ITEMS: usize = 5;
pub const MAX_ITEMS: usize = 50;

/// Clamp a requested item count into `[MIN_ITEMS, MAX_ITEMS]`.
pub fn clamp_count(n: usize) -> usize {
    n.clamp(MIN_ITEMS, MAX_ITEMS)
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("retrieve_requests_total", "Retrieval calls started.");
        describe_counter!(
            "retrieve_provider_items_total",
            "Unique items accepted, by provider."
        );
        describe_counter!(
            "retrieve_provider_errors_total",
            "Provider fetch/parse errors, by provider and kind."
        );
        describe_counter!(
            "retrieve_duplicates_total",
            "Items dropped because their source was already accumulated."
        );
        describe_counter!(
            "retrieve_synthetic_items_total",
            "Synthetic items used to fill short results."
        );
        describe_counter!(
            "retrieve_deadline_exceeded_total",
            "Retrieval calls cut short by the overall deadline."
        );
        describe_histogram!("retrieve_duration_ms", "End-to-end retrieval time in milliseconds.");
        describe_histogram!("retrieve_provider_ms", "Single provider call time in milliseconds.");
    });
}

/// Ordered, source-deduplicated result set for one call.
#[derive(Debug)]
struct Accumulator {
    items: Vec<ContentItem>,
    seen: HashSet<String>,
    target: usize,
}

impl Accumulator {
    fn new(target: usize) -> Self {
        Self {
            items: Vec::with_capacity(target),
            seen: HashSet::with_capacity(target * 2),
            target,
        }
    }

    /// Merge in discovery order. Returns (accepted, duplicates).
    /// Ids are re-sequenced as `<provider>-<position>` so they stay unique per call.
    fn merge(&mut self, provider: &str, items: Vec<ContentItem>) -> (usize, usize) {
        let mut accepted = 0;
        let mut dups = 0;
        for mut item in items {
            if !item.is_valid() {
                continue;
            }
            if !self.seen.insert(item.source.clone()) {
                dups += 1;
                continue;
            }
            item.id = format!("{provider}-{}", self.items.len() + 1);
            self.items.push(item);
            accepted += 1;
        }
        (accepted, dups)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.target
    }

    fn into_items(mut self) -> Vec<ContentItem> {
        self.items.truncate(self.target);
        self.items
    }
}

enum Attempt {
    Items(Vec<ContentItem>),
    Failed(ProviderError),
    OutOfTime,
}

pub struct Retriever {
    providers: Vec<Arc<dyn ContentProvider>>,
    fallback: Option<SyntheticProvider>,
    variations: Vec<String>,
    deadline: Option<Duration>,
}

impl Retriever {
    /// Chain with default variations, synthetic fallback on, no deadline.
    pub fn new(providers: Vec<Arc<dyn ContentProvider>>) -> Self {
        Self {
            providers,
            fallback: Some(SyntheticProvider),
            variations: default_variations(),
            deadline: None,
        }
    }

    /// Build the production chain from config, sharing one HTTP client.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let client = providers::http_client(cfg.retrieval.request_timeout())?;
        let chain = providers::build_chain(&cfg.retrieval, &cfg.secrets, &client);
        let names: Vec<_> = chain.iter().map(|p| p.name()).collect();
        info!(
            target: "retrieve",
            providers = ?names,
            synthetic_fallback = cfg.retrieval.synthetic_fallback,
            deadline_secs = cfg.retrieval.deadline_secs,
            "retrieval chain ready"
        );

        let mut r = Self::new(chain).with_variations(cfg.retrieval.variations.clone());
        if let Some(d) = cfg.retrieval.deadline() {
            r = r.with_deadline(d);
        }
        if !cfg.retrieval.synthetic_fallback {
            r = r.without_synthetic_fallback();
        }
        Ok(r)
    }

    pub fn with_variations(mut self, variations: Vec<String>) -> Self {
        self.variations = variations;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn without_synthetic_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Topic first, then each qualifier appended, in declared order.
    pub fn queries_for(&self, topic: &str) -> Vec<String> {
        std::iter::once(topic.to_string())
            .chain(self.variations.iter().map(|v| format!("{topic} {v}")))
            .collect()
    }

    /// Best-effort, source-unique, order-preserving retrieval of
    /// `clamp_count(desired)` items.
    pub async fn retrieve(
        &self,
        topic: &str,
        desired: usize,
    ) -> Result<Vec<ContentItem>, RetrievalError> {
        ensure_metrics_described();
        counter!("retrieve_requests_total").increment(1);

        let started = Instant::now();
        let topic = topic.trim();
        let target = clamp_count(desired);
        let budget_end = self.deadline.map(|d| started + d);
        let mut acc = Accumulator::new(target);
        let mut out_of_time = false;

        'providers: for provider in &self.providers {
            for query in self.queries_for(topic) {
                if acc.is_full() {
                    break 'providers;
                }
                match self.attempt(provider.as_ref(), &query, target, budget_end).await {
                    Attempt::Items(items) => {
                        let fetched = items.len();
                        let (accepted, dups) = acc.merge(provider.name(), items);
                        counter!("retrieve_provider_items_total", "provider" => provider.name())
                            .increment(accepted as u64);
                        counter!("retrieve_duplicates_total").increment(dups as u64);
                        debug!(
                            target: "retrieve",
                            provider = provider.name(),
                            %query,
                            fetched,
                            accepted,
                            dups,
                            total = acc.len(),
                            target,
                            "provider call merged"
                        );
                    }
                    Attempt::Failed(e) => {
                        counter!(
                            "retrieve_provider_errors_total",
                            "provider" => provider.name(),
                            "kind" => e.kind()
                        )
                        .increment(1);
                        warn!(
                            target: "retrieve",
                            provider = provider.name(),
                            %query,
                            error = %e,
                            "provider call failed"
                        );
                        // Unreachable: skip its variations.
                        if matches!(e, ProviderError::Unavailable { .. }) {
                            continue 'providers;
                        }
                    }
                    Attempt::OutOfTime => {
                        out_of_time = true;
                        counter!("retrieve_deadline_exceeded_total").increment(1);
                        warn!(
                            target: "retrieve",
                            provider = provider.name(),
                            %query,
                            collected = acc.len(),
                            "retrieval deadline reached; keeping partial results"
                        );
                        break 'providers;
                    }
                }
            }
        }

        let mut synthetic = 0;
        if !acc.is_full() {
            if let Some(fallback) = &self.fallback {
                let before = acc.len();
                let (accepted, _) = acc.merge(fallback.name(), fallback.generate(topic, target));
                synthetic = accepted.min(target - before);
                counter!("retrieve_synthetic_items_total").increment(synthetic as u64);
            }
        }

        if acc.len() == 0 {
            warn!(target: "retrieve", %topic, "no provider produced any item");
            return Err(RetrievalError::ExhaustedAllSources {
                topic: topic.to_string(),
            });
        }

        let items = acc.into_items();
        let ms = started.elapsed().as_secs_f64() * 1_000.0;
        histogram!("retrieve_duration_ms").record(ms);
        info!(
            target: "retrieve",
            %topic,
            requested = desired,
            target,
            returned = items.len(),
            synthetic,
            out_of_time,
            elapsed_ms = ms as u64,
            "retrieval finished"
        );
        Ok(items)
    }

    async fn attempt(
        &self,
        provider: &dyn ContentProvider,
        query: &str,
        target: usize,
        budget_end: Option<Instant>,
    ) -> Attempt {
        let t0 = Instant::now();
        let res = match budget_end {
            Some(end) if Instant::now() >= end => return Attempt::OutOfTime,
            Some(end) => match tokio::time::timeout_at(end, provider.fetch(query, target)).await {
                Ok(res) => res,
                Err(_) => return Attempt::OutOfTime,
            },
            None => provider.fetch(query, target).await,
        };
        histogram!("retrieve_provider_ms", "provider" => provider.name())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        match res {
            Ok(items) => Attempt::Items(items),
            Err(e) => Attempt::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize, source: &str) -> ContentItem {
        ContentItem {
            id: format!("x-{n}"),
            text: format!("item {n}"),
            source: source.to_string(),
            title: None,
        }
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_count(0), 5);
        assert_eq!(clamp_count(1), 5);
        assert_eq!(clamp_count(17), 17);
        assert_eq!(clamp_count(1000), 50);
    }

    #[test]
    fn accumulator_drops_duplicates_and_invalid_items() {
        let mut acc = Accumulator::new(5);
        let (a, d) = acc.merge("bing", vec![item(1, "s1"), item(2, "s2"), item(3, "s1")]);
        assert_eq!((a, d), (2, 1));
        let mut bad = item(4, "s4");
        bad.text = "  ".into();
        let (a, d) = acc.merge("reddit", vec![bad, item(5, "s2"), item(6, "s5")]);
        assert_eq!((a, d), (1, 1));
        let items = acc.into_items();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bing-1", "bing-2", "reddit-3"]);
    }

    #[test]
    fn accumulator_truncates_to_target() {
        let mut acc = Accumulator::new(2);
        acc.merge("p", (1..=4).map(|n| item(n, &format!("s{n}"))).collect());
        assert!(acc.is_full());
        let items = acc.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source, "s2");
    }

    #[test]
    fn queries_are_topic_then_variations_in_order() {
        let r = Retriever::new(vec![]);
        assert_eq!(
            r.queries_for("climate change"),
            vec![
                "climate change",
                "climate change latest",
                "climate change news",
                "climate change today",
                "climate change explained"
            ]
        );
        let r = r.with_variations(vec![]);
        assert_eq!(r.queries_for("x"), vec!["x"]);
    }
}
