// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod retrieve;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::{ProviderError, RetrievalError};
pub use crate::retrieve::types::{ContentItem, ContentProvider};
pub use crate::retrieve::Retriever;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

/// Build the application router (without `/metrics`) from a loaded config.
pub fn app(cfg: &AppConfig) -> Result<Router> {
    let retriever = Retriever::from_config(cfg)?;
    let summarizer = summarize::build_summarizer(&cfg.ollama)?;
    info!(
        summarizer = summarizer.provider_name(),
        model = %cfg.ollama.default_model,
        message_style = cfg.analysis.message_style,
        "application state ready"
    );
    let state = AppState {
        retriever: Arc::new(retriever),
        summarizer,
        default_model: cfg.ollama.default_model.clone(),
        message_style: cfg.analysis.message_style,
    };
    Ok(create_router(state))
}
