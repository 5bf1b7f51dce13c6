// src/config/mod.rs
//! Process configuration: TOML file + environment.
//!
//! Lookup order for the file:
//! 1) $TOPIC_DIGEST_CONFIG (must exist)
//! 2) config/digest.toml
//! 3) built-in defaults
//!
//! Credentials come from the environment only.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::retrieve::providers::ProviderKind;
use crate::summarize::DEFAULT_MODEL;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "TOPIC_DIGEST_CONFIG";
pub const ENV_TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/api";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub retrieval: RetrievalConfig,
    pub ollama: OllamaConfig,
    pub analysis: AnalysisConfig,
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Priority order of real providers. The synthetic fallback is always last.
    pub providers: Vec<ProviderKind>,
    /// Qualifiers appended to the topic, tried in order when a provider under-delivers.
    pub variations: Vec<String>,
    pub request_timeout_secs: u64,
    pub request_multiplier: usize,
    /// Budget for the whole provider chain; 0 disables it.
    pub deadline_secs: u64,
    pub synthetic_fallback: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::default_chain(),
            variations: default_variations(),
            request_timeout_secs: 10,
            request_multiplier: 2,
            deadline_secs: 45,
            synthetic_fallback: true,
        }
    }
}

impl RetrievalConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }
}

pub fn default_variations() -> Vec<String> {
    ["latest", "news", "today", "explained"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Feed the summarizer templated messages instead of raw item text.
    pub message_style: bool,
}

/// API credentials. Never logged.
#[derive(Clone, Default)]
pub struct Secrets {
    pub twitter_bearer_token: Option<String>,
    pub serper_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("twitter_bearer_token", &self.twitter_bearer_token.as_ref().map(|_| "<set>"))
            .field("serper_api_key", &self.serper_api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            twitter_bearer_token: non_empty_env(ENV_TWITTER_BEARER_TOKEN),
            serper_api_key: non_empty_env(ENV_SERPER_API_KEY),
        }
    }
}

impl AppConfig {
    /// Resolve the config file, then overlay the environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        self.secrets = Secrets::from_env();
        if let Some(url) = non_empty_env(ENV_OLLAMA_BASE_URL) {
            self.ollama.base_url = url;
        }
    }

    fn sanitize(&mut self) {
        let r = &mut self.retrieval;
        r.request_multiplier = r.request_multiplier.max(1);
        r.request_timeout_secs = r.request_timeout_secs.max(1);

        // Keep first occurrence of each provider.
        let mut seen = Vec::with_capacity(r.providers.len());
        r.providers.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(*p);
                true
            }
        });

        r.variations = r
            .variations
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        self.ollama.base_url = self.ollama.base_url.trim_end_matches('/').to_string();
        if self.ollama.default_model.trim().is_empty() {
            self.ollama.default_model = DEFAULT_MODEL.to_string();
        }
        self.ollama.timeout_secs = self.ollama.timeout_secs.max(1);
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
