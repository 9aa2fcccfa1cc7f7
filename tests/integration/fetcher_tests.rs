//! Integration tests for the HTTP fetcher

use review_trawl::config::UserAgentConfig;
use review_trawl::crawler::{build_http_client, FetchError, HttpFetcher, PageFetcher, PageStatus};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(timeout: Duration) -> HttpFetcher {
    let user_agent = UserAgentConfig {
        crawler_name: "TestTrawler".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    HttpFetcher::new(build_http_client(&user_agent, timeout).expect("Failed to build client"))
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).expect("Failed to parse URL")
}

#[tokio::test]
async fn test_fetch_html_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(header(
            "user-agent",
            "TestTrawler/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>hello</body></html>")
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let page = fetcher(Duration::from_secs(5))
        .fetch(&url(&server, "/reviews"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(page.status, PageStatus::Ok);
    assert!(page.body.as_str().contains("hello"));
}

#[tokio::test]
async fn test_fetch_follows_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let page = fetcher(Duration::from_secs(5))
        .fetch(&url(&server, "/old"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(page.status, PageStatus::Redirected);
    assert_eq!(page.requested_url.path(), "/old");
    assert_eq!(page.url.path(), "/new");
}

#[tokio::test]
async fn test_fetch_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = fetcher(Duration::from_secs(5))
        .fetch(&url(&server, "/missing"))
        .await;

    assert_eq!(result.unwrap_err(), FetchError::HttpStatus(404));
}

#[tokio::test]
async fn test_fetch_non_html_is_failed_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let page = fetcher(Duration::from_secs(5))
        .fetch(&url(&server, "/data.json"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(page.status, PageStatus::Failed);
    assert!(page.body.is_empty());
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = fetcher(Duration::from_millis(300))
        .fetch(&url(&server, "/slow"))
        .await;

    assert_eq!(result.unwrap_err(), FetchError::Timeout);
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Bind then drop a listener so the port is very likely closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let target = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();

    let result = fetcher(Duration::from_secs(2)).fetch(&target).await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}
