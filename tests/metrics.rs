// tests/metrics.rs
//
// One test per binary: the Prometheus recorder is process-global.
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use topic_digest::metrics::Metrics;
use topic_digest::{AppConfig, ContentItem, ContentProvider, ProviderError, Retriever};

struct Flaky;

#[async_trait]
impl ContentProvider for Flaky {
    async fn fetch(
        &self,
        _query: &str,
        _desired: usize,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        Err(ProviderError::malformed("flaky", "unexpected token"))
    }
    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test]
async fn metrics_endpoint_contains_retrieval_series() {
    let metrics = Metrics::init(&AppConfig::default()).expect("install recorder");
    assert!(
        Metrics::init(&AppConfig::default()).is_err(),
        "second install must fail"
    );

    let r = Retriever::new(vec![Arc::new(Flaky)]);
    let items = r.retrieve("metrics", 6).await.expect("synthetic fill");
    assert_eq!(items.len(), 6);

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "retrieve_requests_total",
        "retrieve_provider_errors_total",
        "retrieve_synthetic_items_total",
        "retrieve_duration_ms",
        "retrieve_provider_ms",
        "retrieve_config_deadline_secs",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
    assert!(text.contains(r#"provider="flaky""#));
    assert!(text.contains(r#"kind="malformed""#));
}
