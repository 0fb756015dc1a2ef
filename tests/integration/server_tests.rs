//! Router tests, exercised in-process with `oneshot`

use crate::support::{create_test_config, Reply, StubFetcher};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use url_harvest::server::{router, AppState, RATE_LIMIT_LIMIT, RATE_LIMIT_WINDOW};
use url_harvest::{Config, FetchService};

/// Helper: router and service over a stub fetcher
fn setup(config: Config) -> (Router, Arc<FetchService>) {
    let fetcher = StubFetcher::new().reply("https://a.test", Reply::Body(200, "0123456789"));
    let service = Arc::new(FetchService::with_fetcher(&config, Arc::new(fetcher)));
    let state = AppState::new(Arc::clone(&service), Arc::new(config));
    (router(state), service)
}

fn post_fetch(body: &str, client: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/fetch")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, service) = setup(create_test_config(2));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");

    service.shutdown().await;
}

#[tokio::test]
async fn test_submit_accepted() {
    let (app, service) = setup(create_test_config(2));

    let response = app
        .oneshot(post_fetch(r#"{"urls": ["https://a.test", ""]}"#, "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "URLs submitted for fetching");
    assert_eq!(body["total_urls"], 2);
    assert_eq!(body["status"], "processing");
    assert_eq!(service.snapshot().total_urls, 2);

    service.shutdown().await;
}

#[tokio::test]
async fn test_submit_rejects_invalid_json() {
    let (app, service) = setup(create_test_config(2));

    let response = app
        .oneshot(post_fetch("{not json", "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid JSON payload");
    assert_eq!(service.snapshot().total_urls, 0);

    service.shutdown().await;
}

#[tokio::test]
async fn test_submit_rejects_empty_batch() {
    let (app, service) = setup(create_test_config(2));

    let response = app
        .oneshot(post_fetch(r#"{"urls": []}"#, "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "No URLs provided");

    service.shutdown().await;
}

#[tokio::test]
async fn test_submit_rate_limited() {
    let mut config = create_test_config(2);
    config.rate_limit.requests = 1;
    config.rate_limit.burst = 1;
    config.rate_limit.window_secs = 60;
    let (app, service) = setup(config);

    let first = app
        .clone()
        .oneshot(post_fetch(r#"{"urls": ["https://a.test"]}"#, "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .clone()
        .oneshot(post_fetch(r#"{"urls": ["https://a.test"]}"#, "203.0.113.1, 10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()[RATE_LIMIT_LIMIT], "1");
    assert_eq!(second.headers()[RATE_LIMIT_WINDOW], "1m");

    let body = json_body(second).await;
    assert_eq!(body["error"], "Rate limit exceeded");
    assert_eq!(body["message"], "Maximum 1 requests per 1m allowed");

    // A different client is unaffected
    let other = app
        .oneshot(post_fetch(r#"{"urls": ["https://a.test"]}"#, "198.51.100.9"))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::ACCEPTED);

    service.shutdown().await;
}

#[tokio::test]
async fn test_get_results() {
    let (app, service) = setup(create_test_config(2));

    service
        .submit(vec!["https://a.test".to_string()])
        .unwrap()
        .wait()
        .await;

    let response = app.oneshot(get("/fetch")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total_urls"], 1);
    assert_eq!(body["success_count"], 1);
    assert_eq!(body["results"][0]["url"], "https://a.test");
    assert_eq!(body["results"][0]["status"], "success");
    assert_eq!(body["results"][0]["content_length"], 10);
    assert!(body["results"][0].get("redirect_count").is_none());
    assert!(body["results"][0].get("error").is_none());

    service.shutdown().await;
}

#[tokio::test]
async fn test_stats() {
    let (app, service) = setup(create_test_config(2));

    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["rate_limiter"]["rate"], 100);
    assert_eq!(body["rate_limiter"]["burst"], 20);
    assert_eq!(body["fetch_stats"]["total_urls"], 0);
    assert_eq!(body["cleanup"]["ttl"], "1h");
    assert_eq!(body["cleanup"]["cleanup_interval"], "10m");
    assert_eq!(body["cleanup"]["max_results"], 10000);
    assert_eq!(body["cleanup"]["cleanup_count"], 0);

    service.shutdown().await;
}

#[tokio::test]
async fn test_admin_clear() {
    let (app, service) = setup(create_test_config(2));

    service
        .submit(vec!["https://a.test".to_string(), "https://a.test".to_string()])
        .unwrap()
        .wait()
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/admin/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "All results cleared");
    assert_eq!(body["results_cleared"], 2);
    assert_eq!(service.snapshot().total_urls, 0);

    service.shutdown().await;
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let (app, service) = setup(create_test_config(2));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/fetch")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app.oneshot(get("/admin/clear")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    service.shutdown().await;
}
