// tests/providers_http.rs
//
// Provider adapters against local axum servers serving recorded fixtures.
// Each test binds 127.0.0.1:0, points the adapter at it via its endpoint
// override, and checks parsing, request shape and error translation.

use std::collections::HashMap;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde_json::Value;

use topic_digest::retrieve::providers::{
    bing::BingProvider,
    duckduckgo::DuckDuckGoProvider,
    http_client,
    news::{NewsProvider, NewsSite, SiteKind},
    reddit::RedditProvider,
    serper::SerperProvider,
    twitter::TwitterProvider,
};
use topic_digest::{ContentProvider, Retriever};

const DDG_HTML: &str = include_str!("fixtures/duckduckgo.html");
const BING_HTML: &str = include_str!("fixtures/bing.html");
const REDDIT_HTML: &str = include_str!("fixtures/reddit.html");
const BBC_HTML: &str = include_str!("fixtures/bbc.html");
const GOOGLE_NEWS_XML: &str = include_str!("fixtures/google_news.xml");
const TWITTER_JSON: &str = include_str!("fixtures/twitter.json");
const SERPER_JSON: &str = include_str!("fixtures/serper.json");

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn client() -> Client {
    http_client(Duration::from_secs(5)).expect("client")
}

/// Serves `body` as HTML when the request carries a non-empty `q`.
fn html_page(
    body: &'static str,
) -> impl Fn(Query<HashMap<String, String>>) -> Ready<Response> + Clone + Send + Sync + 'static {
    move |Query(q): Query<HashMap<String, String>>| {
        let resp = match q.get("q") {
            Some(v) if !v.is_empty() => {
                ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
            }
            _ => (StatusCode::BAD_REQUEST, "missing q").into_response(),
        };
        ready(resp)
    }
}

#[tokio::test]
async fn duckduckgo_fixture_is_parsed_and_redirects_unwrapped() {
    let base = spawn(Router::new().route("/html/", get(html_page(DDG_HTML)))).await;
    let p = DuckDuckGoProvider::new(client()).with_endpoint(format!("{base}/html/"));

    let items = p.fetch("climate change", 5).await.expect("ddg fetch");
    let sources: Vec<_> = items.iter().map(|i| i.source.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            "https://www.un.org/en/climatechange/what-is-climate-change",
            "https://climate.nasa.gov/evidence/",
            "https://www.bbc.co.uk/news/science-environment",
        ]
    );
    assert_eq!(
        items[0].text,
        "What Is Climate Change? | United Nations. Climate change refers to long-term shifts in temperatures and weather patterns."
    );
    assert_eq!(
        items[1].text,
        "Evidence & Causes \u{2013} NASA Science. Earth's climate has changed throughout history."
    );
    assert!(items.iter().all(|i| i.is_valid()));
}

#[tokio::test]
async fn bing_fixture_skips_ads_and_resolves_relative_links() {
    let base = spawn(Router::new().route("/search", get(html_page(BING_HTML)))).await;
    let p = BingProvider::new(client()).with_endpoint(format!("{base}/search"));

    let items = p.fetch("climate change", 5).await.expect("bing fetch");
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[0].source,
        "https://www.nationalgeographic.com/environment/article/climate-change"
    );
    assert_eq!(items[2].source, "https://www.bing.com/search?q=climate+change+images");
    assert_eq!(items[1].title.as_deref(), Some("Climate change and health"));
}

#[tokio::test]
async fn reddit_fixture_skips_posts_without_body() {
    let base = spawn(Router::new().route("/search/", get(html_page(REDDIT_HTML)))).await;
    let p = RedditProvider::new(client()).with_endpoint(format!("{base}/search/"));

    let items = p.fetch("climate change", 5).await.expect("reddit fetch");
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].text,
        "Heatwave records broken in three countries. Meteorologists say the trend will continue."
    );
    assert_eq!(
        items[1].source,
        "https://www.reddit.com/r/science/comments/def456/ocean_temps/"
    );
}

#[tokio::test]
async fn twitter_sends_bearer_token_and_size_hint() {
    let router = Router::new().route(
        "/2/tweets/search/recent",
        get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if auth != "Bearer test-token" {
                return (StatusCode::UNAUTHORIZED, "{}".to_string());
            }
            if q.get("max_results").map(String::as_str) != Some("10")
                || q.get("query").map(String::as_str) != Some("climate change")
            {
                return (StatusCode::BAD_REQUEST, "{}".to_string());
            }
            (StatusCode::OK, TWITTER_JSON.to_string())
        }),
    );
    let base = spawn(router).await;
    let endpoint = format!("{base}/2/tweets/search/recent");

    let p = TwitterProvider::new(client(), "test-token").with_endpoint(endpoint.clone());
    let items = p.fetch("climate change", 5).await.expect("twitter fetch");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].text, "New IPCC summary is out & it is sobering.");
    assert_eq!(
        items[0].source,
        "https://twitter.com/i/web/status/1790000000000000001"
    );

    let wrong = TwitterProvider::new(client(), "nope").with_endpoint(endpoint);
    let err = wrong.fetch("climate change", 5).await.unwrap_err();
    assert_eq!(err.kind(), "unavailable");
    assert_eq!(err.provider(), "twitter");
}

#[tokio::test]
async fn serper_posts_json_with_api_key() {
    let router = Router::new().route(
        "/search",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let key_ok = headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|k| k == "serper-key");
            let body_ok = body["q"] == "climate change" && body["num"] == 10;
            if key_ok && body_ok {
                (StatusCode::OK, SERPER_JSON)
            } else {
                (StatusCode::FORBIDDEN, "{}")
            }
        }),
    );
    let base = spawn(router).await;

    let p = SerperProvider::new(client(), "serper-key").with_endpoint(format!("{base}/search"));
    let items = p.fetch("climate change", 5).await.expect("serper fetch");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].source, "https://en.wikipedia.org/wiki/Climate_change");
    assert!(items[0].text.starts_with("Climate Change - NASA Science. NASA is"));
}

#[tokio::test]
async fn news_survives_one_failing_site() {
    let router = Router::new()
        .route(
            "/rss",
            get(|| async { ([(header::CONTENT_TYPE, "application/rss+xml")], GOOGLE_NEWS_XML) }),
        )
        .route("/reuters", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/bbc", get(html_page(BBC_HTML)));
    let base = spawn(router).await;

    let p = NewsProvider::new(client()).with_sites(vec![
        NewsSite::new(SiteKind::GoogleNewsRss, format!("{base}/rss")),
        NewsSite::new(SiteKind::Reuters, format!("{base}/reuters")),
        NewsSite::new(SiteKind::Bbc, format!("{base}/bbc")),
    ]);
    let items = p.fetch("climate change", 5).await.expect("news fetch");

    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0].title.as_deref(),
        Some("UN chief warns of \"climate hell\" - Reuters")
    );
    assert_eq!(
        items[0].text,
        "UN chief warns of \"climate hell\" - Reuters. UN chief warns of climate hell Reuters"
    );
    assert_eq!(items[2].source, "https://www.bbc.com/news/articles/c4ng0zx0l0do");
    assert_eq!(items[3].source, "https://www.bbc.com/future/article/20240710-heat");
}

#[tokio::test]
async fn news_fails_only_when_every_site_fails() {
    let router = Router::new().route("/down", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = spawn(router).await;

    let p = NewsProvider::new(client()).with_sites(vec![
        NewsSite::new(SiteKind::GoogleNewsRss, format!("{base}/down")),
        NewsSite::new(SiteKind::Bbc, format!("{base}/down")),
    ]);
    let err = p.fetch("anything", 5).await.unwrap_err();
    assert_eq!(err.kind(), "unavailable");
    assert_eq!(err.provider(), "news");
}

#[tokio::test]
async fn server_error_is_unavailable_and_bad_json_is_malformed() {
    let router = Router::new()
        .route("/500", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", post(|| async { "<html>definitely not json</html>" }));
    let base = spawn(router).await;

    let p = TwitterProvider::new(client(), "t").with_endpoint(format!("{base}/500"));
    assert_eq!(p.fetch("x", 5).await.unwrap_err().kind(), "unavailable");

    let p = SerperProvider::new(client(), "k").with_endpoint(format!("{base}/garbage"));
    assert_eq!(p.fetch("x", 5).await.unwrap_err().kind(), "malformed");
}

#[tokio::test]
async fn slow_source_times_out_as_unavailable() {
    let router = Router::new().route(
        "/search",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            BING_HTML
        }),
    );
    let base = spawn(router).await;

    let fast_client = http_client(Duration::from_millis(300)).expect("client");
    let p = BingProvider::new(fast_client).with_endpoint(format!("{base}/search"));
    let err = p.fetch("climate change", 5).await.unwrap_err();
    assert_eq!(err.kind(), "unavailable");
}

#[tokio::test]
async fn hanging_source_leaves_time_for_the_next_one() {
    let router = Router::new()
        .route(
            "/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                BING_HTML
            }),
        )
        .route("/reddit", get(html_page(REDDIT_HTML)));
    let base = spawn(router).await;

    let fast_client = http_client(Duration::from_millis(300)).expect("client");
    let retriever = Retriever::new(vec![
        Arc::new(BingProvider::new(fast_client).with_endpoint(format!("{base}/hang"))),
        Arc::new(RedditProvider::new(client()).with_endpoint(format!("{base}/reddit"))),
    ])
    .with_deadline(Duration::from_millis(1350));
    let items = retriever.retrieve("climate change", 5).await.expect("retrieve");

    let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids[..2], ["reddit-1", "reddit-2"]);
    assert_eq!(
        items[1].source,
        "https://www.reddit.com/r/science/comments/def456/ocean_temps/"
    );
}

#[tokio::test]
async fn scraped_chain_fills_target_in_priority_order() {
    let router = Router::new()
        .route("/ddg", get(html_page(DDG_HTML)))
        .route("/bing", get(html_page(BING_HTML)))
        .route("/reddit", get(html_page(REDDIT_HTML)));
    let base = spawn(router).await;
    let c = client();

    let retriever = Retriever::new(vec![
        Arc::new(DuckDuckGoProvider::new(c.clone()).with_endpoint(format!("{base}/ddg"))),
        Arc::new(BingProvider::new(c.clone()).with_endpoint(format!("{base}/bing"))),
        Arc::new(RedditProvider::new(c).with_endpoint(format!("{base}/reddit"))),
    ]);
    let items = retriever.retrieve("climate change", 8).await.expect("retrieve");

    let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "duckduckgo-1",
            "duckduckgo-2",
            "duckduckgo-3",
            "bing-4",
            "bing-5",
            "bing-6",
            "reddit-7",
            "reddit-8",
        ]
    );
    assert!(items.iter().all(|i| !i.source.starts_with("synthetic://")));
}
