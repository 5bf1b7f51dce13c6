use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::RetrievalError;
use crate::retrieve::synthesize::synthesize_messages;
use crate::retrieve::types::ContentItem;
use crate::retrieve::Retriever;
use crate::summarize::{ModelInfo, Summarizer};

pub const DEFAULT_TWEET_COUNT: i64 = 20;

#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub summarizer: Arc<dyn Summarizer>,
    pub default_model: String,
    /// Feed templated messages to the summarizer instead of raw item text.
    pub message_style: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/analyze-topic", post(analyze_topic))
        .route("/api/ollama-models", get(ollama_models))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    topic: String,
    #[serde(rename = "tweetCount", default = "default_tweet_count")]
    tweet_count: i64,
    #[serde(default)]
    model: Option<String>,
}

fn default_tweet_count() -> i64 {
    DEFAULT_TWEET_COUNT
}

#[derive(Serialize)]
struct AnalyzeResp {
    summary: String,
    sentiment: String,
    #[serde(rename = "tweetCount")]
    tweet_count: usize,
    model: String,
}

#[derive(Serialize)]
struct ModelsResp {
    models: Vec<ModelInfo>,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(&'static str),
    NoContent,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NoContent => (StatusCode::SERVICE_UNAVAILABLE, "Could not retrieve content"),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

impl From<RetrievalError> for ApiError {
    fn from(_: RetrievalError) -> Self {
        ApiError::NoContent
    }
}

async fn analyze_topic(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<AnalyzeResp>, ApiError> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty"));
    }
    let model = body
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(state.default_model.as_str())
        .to_string();
    let desired = usize::try_from(body.tweet_count.max(0)).unwrap_or(0);

    let items = state.retriever.retrieve(topic, desired).await.map_err(|e| {
        warn!(error = %e, %topic, "analyze-topic: retrieval exhausted");
        ApiError::from(e)
    })?;

    let text = joined_text(&items, state.message_style);
    let summary = state.summarizer.summary(topic, &text, &model).await;
    let sentiment = state.summarizer.sentiment(&text, &model).await;

    info!(%topic, items = items.len(), %model, "analyze-topic done");
    Ok(Json(AnalyzeResp {
        summary,
        sentiment,
        tweet_count: items.len(),
        model,
    }))
}

/// Item texts separated by blank lines.
fn joined_text(items: &[ContentItem], message_style: bool) -> String {
    if message_style {
        synthesize_messages(items, items.len())
            .into_iter()
            .map(|m| m.text)
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        items
            .iter()
            .map(|i| i.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

async fn ollama_models(State(state): State<AppState>) -> Json<ModelsResp> {
    Json(ModelsResp {
        models: state.summarizer.models().await,
    })
}
