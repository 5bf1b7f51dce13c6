// src/retrieve/providers/synthetic.rs
//! Infallible placeholder generator. Last resort of the fallback chain.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::ProviderError;
use crate::retrieve::normalize::collapse_ws;
use crate::retrieve::types::{ContentItem, ContentProvider};
use crate::retrieve::{clamp_count, MAX_ITEMS};

const NAME: &str = "mock";

// `{}` is replaced by the topic.
const TEMPLATES: [&str; MAX_ITEMS] = [
    "Just read an interesting article about {}. It's changing everything!",
    "I don't understand why people are so excited about {}. Seems overrated to me.",
    "New research on {} shows promising results. This could be revolutionary.",
    "Anyone else following the developments in {}? I'm really impressed so far.",
    "The media coverage of {} is so biased. We need more balanced reporting.",
    "Just attended a conference on {}. The experts are divided on its future impact.",
    "{} is trending again today. This happens every few months but nothing changes.",
    "I've been studying {} for years and I'm excited about the recent breakthroughs.",
    "Government regulation of {} is desperately needed before it's too late.",
    "The best thing about {} is how it brings people together across different backgrounds.",
    "{} might be the most important innovation of our generation. Can't wait to see where it goes.",
    "I'm skeptical about {}. Too much hype, not enough substance.",
    "My company just invested heavily in {} technology. Big things coming!",
    "{} is changing how we think about sustainability and environmental impact.",
    "The ethical implications of {} aren't discussed enough. We need more oversight.",
    "{} is creating new jobs but also eliminating others. Mixed feelings about this.",
    "Just published my research paper on {}. DM me if you want a copy!",
    "{} is not accessible to everyone and that's a serious problem we need to address.",
    "The international competition around {} is heating up. Who will lead?",
    "{} was the main discussion at yesterday's board meeting. Everyone's paying attention now.",
    "I've been a {} skeptic but recent developments have changed my mind completely.",
    "{} needs more diversity of thought and background. Too homogeneous right now.",
    "The cost of implementing {} is dropping fast. Expect widespread adoption soon.",
    "{} is creating a divide between generations. Younger people get it, older folks are resistant.",
    "Just launched my startup focused on {}. Exciting and terrifying at the same time!",
    "{} is evolving so quickly it's hard to keep up with the latest developments.",
    "The potential of {} to solve global problems is underestimated by most people.",
    "{} is being overhyped by investors looking for the next big thing. Be cautious.",
    "Education about {} should start early. Our kids need to understand this.",
    "{} is creating new forms of inequality we haven't even begun to address.",
    "The history of {} is fascinating. It didn't just appear overnight!",
    "{} is bringing people together across political divides. That's rare these days.",
    "The unintended consequences of {} could be serious. We need more caution.",
    "{} is more complex than most media coverage suggests. Nuance matters.",
    "Just experienced {} firsthand and I'm completely blown away. Game changer!",
    "{} is creating opportunities for communities that have been left behind.",
    "The pace of innovation in {} is unprecedented. What a time to be alive!",
    "{} needs more public funding and support to reach its full potential.",
    "The experts on {} disagree on fundamental issues. That's concerning.",
    "{} is transforming my industry in ways I never imagined possible.",
    "The global implications of {} aren't being taken seriously enough.",
    "{} is creating a new digital divide. We need to ensure equal access.",
    "Just finished a book about {} that completely changed my perspective.",
    "{} is advancing too quickly for regulations to keep up. That's dangerous.",
    "The collaboration happening around {} gives me hope for humanity.",
    "{} is being implemented without proper testing or validation. Risky.",
    "The economic impact of {} will be felt for generations to come.",
    "{} is creating strange new alliances between former competitors.",
    "The cultural shift happening because of {} is the most interesting part.",
    "{} represents both our greatest hope and our greatest challenge.",
];

/// Deterministic: same topic and count always yield the same items.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    /// Exactly `clamp(desired, MIN_ITEMS, MAX_ITEMS)` items with unique `synthetic://` sources.
    pub fn generate(&self, topic: &str, desired: usize) -> Vec<ContentItem> {
        let topic = topic.trim();
        let digest = topic_digest(topic);
        TEMPLATES
            .iter()
            .take(clamp_count(desired))
            .enumerate()
            .map(|(i, tpl)| {
                let n = i + 1;
                ContentItem {
                    id: format!("{NAME}-{n}"),
                    text: collapse_ws(&tpl.replace("{}", topic)),
                    source: format!("synthetic://{digest}/{n}"),
                    title: Some(format!("{topic} #{n}").trim().to_string()),
                }
            })
            .collect()
    }
}

#[async_trait]
impl ContentProvider for SyntheticProvider {
    async fn fetch(&self, query: &str, desired: usize) -> Result<Vec<ContentItem>, ProviderError> {
        Ok(self.generate(query, desired))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

/// 12 hex chars of SHA-256 over the topic.
fn topic_digest(topic: &str) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(topic.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
