// src/error.rs
//! Error taxonomy for content retrieval.
//!
//! Provider errors are absorbed by the orchestrator (logged, counted, never
//! re-raised). Only `RetrievalError` reaches the request layer.

use std::fmt::Display;

use thiserror::Error;

/// Failure of a single provider call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network error, timeout or non-success HTTP status.
    #[error("{provider} unavailable: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },
    /// The payload arrived but did not have the expected shape.
    #[error("{provider} returned a malformed response: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    pub fn unavailable(provider: &'static str, reason: impl Display) -> Self {
        Self::Unavailable {
            provider,
            reason: reason.to_string(),
        }
    }

    pub fn malformed(provider: &'static str, reason: impl Display) -> Self {
        Self::Malformed {
            provider,
            reason: reason.to_string(),
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::Unavailable { provider, .. } | Self::Malformed { provider, .. } => provider,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Malformed { .. } => "malformed",
        }
    }
}

/// Terminal retrieval failure. Only reachable when the synthetic fallback is
/// disabled and every real provider came back empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("could not retrieve content for {topic:?}: all sources exhausted")]
    ExhaustedAllSources { topic: String },
}
