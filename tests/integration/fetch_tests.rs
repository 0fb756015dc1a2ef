//! HTTP fetcher tests against wiremock servers

use crate::support::create_test_options;
use std::time::Duration;
use url_harvest::{Fetch, FetchError, FetchOptions, HttpFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_with(options: FetchOptions) -> HttpFetcher {
    HttpFetcher::new(options).expect("Failed to build HTTP client")
}

/// Mounts `/hop0` -> `/hop1` -> ... -> `/hop{hops}` where the last hop returns 200
async fn mount_redirect_chain(server: &MockServer, hops: usize) {
    for i in 0..hops {
        Mock::given(method("GET"))
            .and(path(format!("/hop{}", i)))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/hop{}", server.uri(), i + 1).as_str()),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(format!("/hop{}", hops)))
        .respond_with(ResponseTemplate::new(200).set_body_string("end of chain"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0123456789"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());
    let outcome = fetcher_with(create_test_options()).fetch(&url).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.body.as_deref().unwrap(), "0123456789");
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.redirect_count, 0);
    assert_eq!(outcome.final_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "URL-Fetch-Service/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("identified"))
        .mount(&mock_server)
        .await;

    let outcome = fetcher_with(create_test_options())
        .fetch(&format!("{}/ua", mock_server.uri()))
        .await;

    // Without the header the mock would not match and wiremock answers 404
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.body.as_deref().unwrap(), "identified");
}

#[tokio::test]
async fn test_user_agent_is_sent_on_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/landing", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header("user-agent", "URL-Fetch-Service/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .mount(&mock_server)
        .await;

    let outcome = fetcher_with(create_test_options())
        .fetch(&format!("{}/start", mock_server.uri()))
        .await;

    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.redirect_count, 1);
}

#[tokio::test]
async fn test_redirects_are_followed_and_counted() {
    let mock_server = MockServer::start().await;
    mount_redirect_chain(&mock_server, 2).await;

    let outcome = fetcher_with(create_test_options())
        .fetch(&format!("{}/hop0", mock_server.uri()))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.redirect_count, 2);
    assert_eq!(
        outcome.final_url.as_deref(),
        Some(format!("{}/hop2", mock_server.uri()).as_str())
    );
    assert_eq!(outcome.body.as_deref().unwrap(), "end of chain");
}

#[tokio::test]
async fn test_redirect_limit_exceeded() {
    let mock_server = MockServer::start().await;
    mount_redirect_chain(&mock_server, 5).await;

    let options = FetchOptions {
        max_redirects: 2,
        ..create_test_options()
    };
    let outcome = fetcher_with(options)
        .fetch(&format!("{}/hop0", mock_server.uri()))
        .await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.redirect_count, 2);
    assert_eq!(outcome.status_code, Some(302));
    assert!(matches!(outcome.error(), Some(FetchError::RedirectLimit { max: 2 })));
    assert_eq!(outcome.error().unwrap().to_string(), "stopped after 2 redirects");
}

#[tokio::test]
async fn test_redirect_limit_allows_exactly_max_hops() {
    let mock_server = MockServer::start().await;
    mount_redirect_chain(&mock_server, 3).await;

    let options = FetchOptions {
        max_redirects: 3,
        ..create_test_options()
    };
    let outcome = fetcher_with(options)
        .fetch(&format!("{}/hop0", mock_server.uri()))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.redirect_count, 3);
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        timeout: Duration::from_millis(300),
        ..create_test_options()
    };
    let outcome = fetcher_with(options)
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await;

    assert!(matches!(outcome.error(), Some(FetchError::Timeout)));
    assert_eq!(outcome.error().unwrap().to_string(), "Request timeout exceeded");
    assert!(outcome.duration < Duration::from_secs(3));
}

#[tokio::test]
async fn test_body_too_large() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        max_content_bytes: 16,
        ..create_test_options()
    };
    let outcome = fetcher_with(options)
        .fetch(&format!("{}/big", mock_server.uri()))
        .await;

    assert!(matches!(outcome.error(), Some(FetchError::BodyTooLarge { limit: 16 })));
    assert_eq!(
        outcome.error().unwrap().to_string(),
        "Response body too large (exceeds 16 bytes)"
    );
    assert_eq!(outcome.status_code, Some(200));
}

#[tokio::test]
async fn test_body_just_under_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fits"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(15)))
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        max_content_bytes: 16,
        ..create_test_options()
    };
    let outcome = fetcher_with(options)
        .fetch(&format!("{}/fits", mock_server.uri()))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.body.as_deref().unwrap().len(), 15);
}

#[tokio::test]
async fn test_error_status_is_a_successful_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let outcome = fetcher_with(create_test_options())
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.status_code, Some(404));
    assert_eq!(outcome.body.as_deref().unwrap(), "not here");
}

#[tokio::test]
async fn test_connection_refused() {
    // Reserve a port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let outcome = fetcher_with(create_test_options())
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await;

    assert!(matches!(outcome.error(), Some(FetchError::Transport(_))));
    assert!(outcome
        .error()
        .unwrap()
        .to_string()
        .starts_with("Failed to fetch URL"));
    assert!(outcome.status_code.is_none());
}
