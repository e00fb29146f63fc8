//! End-to-end tests for the HTTP fetcher against a local mock server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prediction_extractor::query::{find_all, TreeQuery};
use prediction_extractor::{
    FetchError, HtmlFetcher, HttpFetcher, HttpFetcherConfig, PredictionSource,
};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(HttpFetcherConfig {
        requests_per_second: 1_000,
        burst_size: 1_000,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_and_parses_a_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/predictions/page/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="prediction"></div><div class="prediction"></div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let html = fetcher()
        .fetch_html(&cancel, &format!("{}/predictions/page/1", server.uri()))
        .await
        .unwrap();

    let records = find_all(html.tree.root(), &TreeQuery::class("prediction"));
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn a_non_success_status_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = fetcher()
        .fetch_html(&cancel, &format!("{}/predictions/page/1", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn a_connection_failure_is_a_transport_error() {
    // Nothing listens on the discard port.
    let cancel = CancellationToken::new();
    let err = fetcher()
        .fetch_html(&cancel, "http://127.0.0.1:9/predictions/page/1")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn a_crawl_runs_end_to_end_over_http() {
    let server = MockServer::start().await;
    let page = |records: &str, nav: &str| {
        format!("<html><body><ul>{records}</ul>{nav}</body></html>")
    };
    let record = |id: i64| {
        format!(
            r#"<li class="prediction"><span class="title"><a href="/predictions/{id}">P{id}</a></span></li>"#,
        )
    };
    let nav =
        r#"<nav class="pagination"><span class="last"><a href="/predictions/page/2">Last</a></span></nav>"#;

    Mock::given(method("GET"))
        .and(path("/predictions/page/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&record(12), nav)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/page/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&record(11), "")))
        .mount(&server)
        .await;

    let source = PredictionSource::new(Arc::new(fetcher()), server.uri());
    let cancel = CancellationToken::new();
    let all = source.all_predictions(&cancel).await.unwrap();

    let ids: Vec<i64> = all.iter().map(|summary| summary.id).collect();
    assert_eq!(ids, vec![11, 12]);
}
