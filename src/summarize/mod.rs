//! Summarizer: local Ollama text generation behind a small trait.
//!
//! Callers never see an error from here: failed generations come back as a
//! fixed fallback sentence naming the model, failed model listings as an
//! empty list.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::OllamaConfig;

pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// Model entry as reported by `GET /api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summary(&self, topic: &str, text: &str, model: &str) -> String;
    async fn sentiment(&self, text: &str, model: &str) -> String;
    async fn models(&self) -> Vec<ModelInfo>;
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Factory: `SUMMARIZER_MODE=mock` gives a deterministic mock, otherwise Ollama.
pub fn build_summarizer(cfg: &OllamaConfig) -> Result<DynSummarizer> {
    if std::env::var("SUMMARIZER_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockSummarizer::default()));
    }
    Ok(Arc::new(OllamaClient::new(cfg)?))
}

pub fn summary_fallback(model: &str) -> String {
    format!("Failed to generate summary. Please ensure Ollama is running with the {model} model.")
}

pub fn sentiment_fallback(model: &str) -> String {
    format!("Failed to analyze sentiment. Please ensure Ollama is running with the {model} model.")
}

pub fn summary_prompt(topic: &str, text: &str) -> String {
    format!(
        "Below are several posts about \"{topic}\".\n\
         Please provide a concise summary (about 3-5 sentences) of the main points, trends, and discussions happening around this topic.\n\n\
         Posts:\n{text}\n\n\
         Summary:"
    )
}

pub fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following posts. Classify the overall sentiment as one of:\n\
         - Very Positive\n\
         - Positive\n\
         - Neutral\n\
         - Negative\n\
         - Very Negative\n\n\
         Also provide a brief explanation for your classification.\n\n\
         Posts:\n{text}\n\n\
         Sentiment:"
    )
}

// ------------------------------------------------------------
// Ollama
// ------------------------------------------------------------

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateReq<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResp {
    response: String,
}

#[derive(Deserialize)]
struct TagsResp {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    pub fn new(cfg: &OllamaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("topic-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building ollama http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/generate", self.base_url))
            .json(&GenerateReq {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .context("ollama /generate request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("ollama /generate HTTP {}", resp.status()));
        }
        let body: GenerateResp = resp.json().await.context("decoding ollama /generate")?;
        Ok(body.response.trim().to_string())
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let resp = self
            .http
            .get(format!("{}/tags", self.base_url))
            .send()
            .await
            .context("ollama /tags request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("ollama /tags HTTP {}", resp.status()));
        }
        let body: TagsResp = resp.json().await.context("decoding ollama /tags")?;
        Ok(body.models)
    }
}

#[async_trait]
impl Summarizer for OllamaClient {
    async fn summary(&self, topic: &str, text: &str, model: &str) -> String {
        match self.generate(model, &summary_prompt(topic, text)).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = ?e, %model, "summary generation failed");
                summary_fallback(model)
            }
        }
    }

    async fn sentiment(&self, text: &str, model: &str) -> String {
        match self.generate(model, &sentiment_prompt(text)).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = ?e, %model, "sentiment generation failed");
                sentiment_fallback(model)
            }
        }
    }

    async fn models(&self) -> Vec<ModelInfo> {
        self.list_models().await.unwrap_or_else(|e| {
            warn!(error = ?e, "listing ollama models failed");
            Vec::new()
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Fixed answers for tests/local runs without a model server.
#[derive(Debug, Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub sentiment: String,
    pub models: Vec<String>,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            summary: "Summary (mock)".to_string(),
            sentiment: "Neutral (mock)".to_string(),
            models: vec![DEFAULT_MODEL.to_string()],
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summary(&self, _topic: &str, _text: &str, _model: &str) -> String {
        self.summary.clone()
    }

    async fn sentiment(&self, _text: &str, _model: &str) -> String {
        self.sentiment.clone()
    }

    async fn models(&self) -> Vec<ModelInfo> {
        self.models
            .iter()
            .map(|name| ModelInfo {
                name: name.clone(),
                model: Some(name.clone()),
                modified_at: None,
                size: None,
                digest: None,
            })
            .collect()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
