use std::time::Duration;

use feedsmith_engine::{FetchError, FetchSettings, Fetcher, ReqwestFetcher};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_retry_settings() -> FetchSettings {
    FetchSettings {
        backoff_factor: Duration::from_millis(5),
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn fetcher_returns_document_with_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/news", server.uri());

    let document = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(document.status, 200);
    assert_eq!(document.html, "<html>ok</html>");
    assert_eq!(document.final_url, url);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(quick_retry_settings()).unwrap();
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err, FetchError::HttpStatus(404));
}

#[tokio::test]
async fn permanent_server_error_is_retried_three_times_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(quick_retry_settings()).unwrap();
    let url = format!("{}/flaky", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err, FetchError::HttpStatus(503));
}

#[tokio::test]
async fn transient_server_error_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recovers"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recovers"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>late</html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(quick_retry_settings()).unwrap();
    let url = format!("{}/recovers", server.uri());

    let document = fetcher.fetch(&url).await.expect("second attempt succeeds");
    assert_eq!(document.html, "<html>late</html>");
}

#[tokio::test]
async fn slow_response_is_classified_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        max_attempts: 1,
        ..quick_retry_settings()
    };
    let fetcher = ReqwestFetcher::new(settings).unwrap();
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn unparsable_url_is_rejected_before_any_request() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let err = fetcher.fetch("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)), "got {err:?}");
}
