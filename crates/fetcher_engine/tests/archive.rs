use std::time::{Duration, Instant};

use fetcher_engine::{ArchiveIndex, ArchiveSettings, CdxArchiveClient, FailureKind};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;

const CDX_PATH: &str = "/cdx/search/cdx";

fn client_for(server: &MockServer) -> CdxArchiveClient {
    client_with(server, ArchiveSettings::default())
}

fn client_with(server: &MockServer, settings: ArchiveSettings) -> CdxArchiveClient {
    CdxArchiveClient::new(ArchiveSettings {
        endpoint: format!("{}{}", server.uri(), CDX_PATH),
        backoff_base: Duration::from_millis(1),
        ..settings
    })
    .expect("client builds")
}

#[tokio::test]
async fn returns_one_candidate_per_non_blank_line() {
    support::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("url", "*.example.com/*"))
        .and(query_param("collapse", "urlkey"))
        .and(query_param("output", "text"))
        .and(query_param("fl", "original"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a\nb\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let urls = client_for(&server).fetch("example.com").await.unwrap();
    assert_eq!(urls, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn gives_up_after_five_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;

    let err = client_for(&server).fetch("example.com").await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::RetriesExhausted {
            attempts: 5,
            last_status: 503
        }
    );
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://example.com/x.pdf\n"))
        .mount(&server)
        .await;

    let urls = client_for(&server).fetch("example.com").await.unwrap();
    assert_eq!(urls, vec!["https://example.com/x.pdf".to_string()]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn does_not_retry_permanent_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).fetch("example.com").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn respects_configured_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let settings = ArchiveSettings {
        max_attempts: 2,
        ..ArchiveSettings::default()
    };
    let err = client_with(&server, settings)
        .fetch("example.com")
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::RetriesExhausted {
            attempts: 2,
            last_status: 429
        }
    );
}

#[tokio::test]
async fn waits_as_long_as_a_rate_limited_server_asks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://example.com/x.sql\n"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let urls = client_for(&server).fetch("example.com").await.unwrap();

    assert_eq!(urls, vec!["https://example.com/x.sql".to_string()]);
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "retried after {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn times_out_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("late"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = ArchiveSettings {
        request_timeout: Duration::from_millis(50),
        ..ArchiveSettings::default()
    };
    let err = client_with(&server, settings)
        .fetch("example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn rejects_empty_domain_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).fetch("   ").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidInput);
}

#[tokio::test]
async fn trims_domain_before_querying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("url", "*.example.org/*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let urls = client_for(&server).fetch(" example.org\n").await.unwrap();
    assert!(urls.is_empty());
}
