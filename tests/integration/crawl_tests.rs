//! Integration tests for the crawler
//!
//! These tests use wiremock to serve paginated review listings and run the
//! full controller cycle end-to-end against a file sink and a SQLite
//! checkpoint database.

use review_trawl::config::UserAgentConfig;
use review_trawl::crawler::{
    build_http_client, Controller, CrawlTarget, FailureReason, HttpFetcher, RetryPolicy,
};
use review_trawl::extract::Grouping;
use review_trawl::output::{FileSink, RecordWriter};
use review_trawl::storage::{CheckpointStore, SqliteCheckpointStore};
use review_trawl::{CrawlPhase, CrawlReport, FieldMap};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A listing page with one review block per author
fn listing(authors: &[&str], next: Option<&str>) -> String {
    let reviews: String = authors
        .iter()
        .map(|author| {
            format!(
                r#"<div itemprop="review">
                     <span itemprop="author">{}</span>
                     <span class="ml-4th">Mid-Market (51-1000 emp.)</span>
                     <time>Mar 3, 2020</time>
                     <h5 class="l5">What do you like best?</h5>
                     <p class="formatted-text">It just works.</p>
                   </div>"#,
                author
            )
        })
        .collect();
    let pager = next
        .map(|href| format!(r#"<ul class="pagination"><li><a href="{}">Next ›</a></li></ul>"#, href))
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", reviews, pager)
}

async fn mount_page(server: &MockServer, p: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn http_fetcher() -> HttpFetcher {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5))
        .expect("Failed to build client");
    HttpFetcher::new(client)
}

fn per_review() -> FieldMap {
    FieldMap {
        grouping: Grouping::PerReview,
        ..FieldMap::default()
    }
}

fn seed(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).expect("Failed to parse seed")
}

async fn run_crawl(dir: &TempDir, target: CrawlTarget, fresh: bool) -> CrawlReport {
    let sink = FileSink::open(&dir.path().join("reviews.jl")).expect("Failed to open output");
    let store = SqliteCheckpointStore::new(&dir.path().join("checkpoints.db"))
        .expect("Failed to open checkpoints");

    Controller::new(
        target,
        http_fetcher(),
        RecordWriter::new(sink),
        store,
        per_review(),
    )
    .expect("Failed to create controller")
    .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)))
    .with_fresh_start(fresh)
    .run()
    .await
    .expect("Crawl should not hit an infrastructure error")
}

fn output_authors(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).expect("Invalid JSON line");
            record["author"][0].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_full_pagination_chain() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews/1", listing(&["Ann", "Bob"], Some("/reviews/2"))).await;
    mount_page(&server, "/reviews/2", listing(&["Cy"], Some("3"))).await;
    mount_page(&server, "/reviews/3", listing(&["Di"], None)).await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::new(vec![seed(&server, "/reviews/1")], 10, 0).unwrap();
    let report = run_crawl(&dir, target, false).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.records_written, 4);
    assert_eq!(
        output_authors(&dir.path().join("reviews.jl")),
        vec!["Ann", "Bob", "Cy", "Di"]
    );

    let line = std::fs::read_to_string(dir.path().join("reviews.jl")).unwrap();
    let first: serde_json::Value = serde_json::from_str(line.lines().next().unwrap()).unwrap();
    assert_eq!(first["company_size"][0], "Mid-Market (51-1000 emp.)");
    assert_eq!(first["qa_pairs"][0]["question"], "What do you like best?");
    assert_eq!(first["qa_pairs"][0]["answer"], "It just works.");
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", listing(&["Ann"], None)).await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::new(vec![seed(&server, "/flaky")], 10, 0).unwrap();
    let report = run_crawl(&dir, target, false).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.records_written, 1);
}

#[tokio::test]
async fn test_redirect_back_to_seed_ends_chain() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/reviews/1"))
        .mount(&server)
        .await;
    mount_page(&server, "/reviews/1", listing(&["Ann"], Some("/reviews/2"))).await;
    // Page 2 links back to the redirecting seed
    mount_page(&server, "/reviews/2", listing(&["Bob"], Some("/start"))).await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::new(vec![seed(&server, "/start")], 10, 0).unwrap();
    let report = run_crawl(&dir, target, false).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(
        output_authors(&dir.path().join("reviews.jl")),
        vec!["Ann", "Bob"]
    );
}

#[tokio::test]
async fn test_failed_crawl_resumes_without_duplicates() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews/1", listing(&["Ann", "Bob"], Some("/reviews/2"))).await;

    Mock::given(method("GET"))
        .and(path("/reviews/2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "/reviews/2", listing(&["Cy"], None)).await;

    let dir = TempDir::new().unwrap();
    let seeds = vec![seed(&server, "/reviews/1")];

    let first = run_crawl(&dir, CrawlTarget::new(seeds.clone(), 10, 0).unwrap(), false).await;
    assert_eq!(first.phase, CrawlPhase::Failed);
    assert_eq!(first.records_written, 2);
    assert!(first
        .failed_url
        .as_deref()
        .is_some_and(|u| u.ends_with("/reviews/2")));
    assert!(matches!(
        first.failure,
        Some(FailureReason::FetchExhausted { attempts: 3, .. })
    ));

    let second = run_crawl(&dir, CrawlTarget::new(seeds.clone(), 10, 0).unwrap(), false).await;
    assert_eq!(second.phase, CrawlPhase::Done);
    assert_eq!(second.records_written, 3);
    assert_eq!(
        output_authors(&dir.path().join("reviews.jl")),
        vec!["Ann", "Bob", "Cy"]
    );

    // A third run finds the completed checkpoint and writes nothing
    let third = run_crawl(&dir, CrawlTarget::new(seeds.clone(), 10, 0).unwrap(), false).await;
    assert_eq!(third.phase, CrawlPhase::Done);
    assert_eq!(output_authors(&dir.path().join("reviews.jl")).len(), 3);

    let store = SqliteCheckpointStore::new(&dir.path().join("checkpoints.db")).unwrap();
    let key = CrawlTarget::new(seeds, 10, 0).unwrap().identity();
    let checkpoint = store.load(&key).unwrap().expect("Checkpoint should exist");
    assert!(checkpoint.is_completed());
}

#[tokio::test]
async fn test_record_budget_limits_output() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews/1", listing(&["Ann", "Bob"], Some("/reviews/2"))).await;
    mount_page(&server, "/reviews/2", listing(&["Cy"], None)).await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::new(vec![seed(&server, "/reviews/1")], 10, 1).unwrap();
    let report = run_crawl(&dir, target, false).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(output_authors(&dir.path().join("reviews.jl")), vec!["Ann"]);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/reviews/2"));
}

#[tokio::test]
async fn test_second_target_appends_to_shared_output() {
    let server = MockServer::start().await;
    mount_page(&server, "/first", listing(&["Ann"], None)).await;
    mount_page(&server, "/second", listing(&["Bob"], None)).await;

    let dir = TempDir::new().unwrap();
    let first = CrawlTarget::new(vec![seed(&server, "/first")], 10, 0).unwrap();
    let second = CrawlTarget::new(vec![seed(&server, "/second")], 10, 0).unwrap();

    run_crawl(&dir, first, false).await;
    let report = run_crawl(&dir, second, false).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(
        output_authors(&dir.path().join("reviews.jl")),
        vec!["Ann", "Bob"]
    );
}

#[tokio::test]
async fn test_fresh_start_recrawls_and_appends() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews/1", listing(&["Ann"], None)).await;

    let dir = TempDir::new().unwrap();
    let seeds = vec![seed(&server, "/reviews/1")];

    run_crawl(&dir, CrawlTarget::new(seeds.clone(), 10, 0).unwrap(), false).await;
    let report = run_crawl(&dir, CrawlTarget::new(seeds, 10, 0).unwrap(), true).await;

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(
        output_authors(&dir.path().join("reviews.jl")),
        vec!["Ann", "Ann"]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
