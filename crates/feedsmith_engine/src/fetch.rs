use std::time::Duration;

use pipeline_logging::pipeline_warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;

use crate::types::RawDocument;

/// Statuses worth another attempt; everything else non-2xx fails immediately.
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Browser identity presented to servers that reject non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Total attempts, counting the first. Default 3: one try, two retries.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: Duration,
    /// Skip TLS certificate verification for sites with broken certs.
    /// Deliberately opt-in; the default verifies.
    pub accept_invalid_certs: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_attempts: 3,
            backoff_factor: Duration::from_millis(500),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("redirect limit exceeded: {0}")]
    RedirectLimit(String),
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// Fetcher over a single reusable `reqwest` session, so repeated requests to
/// one site share a keep-alive connection. Each source gets its own instance.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .default_headers(browser_headers())
            .build()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    async fn attempt(&self, url: reqwest::Url) -> Result<RawDocument, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        if RETRYABLE_STATUSES.contains(&status) {
            return Err(Attempt::Transient(FetchError::HttpStatus(status)));
        }
        if !response.status().is_success() {
            return Err(Attempt::Fatal(FetchError::HttpStatus(status)));
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(classify_transport)?;
        Ok(RawDocument {
            html,
            status,
            final_url,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::InvalidUrl(err.to_string()))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(parsed.clone()).await {
                Ok(document) => return Ok(document),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Transient(err)) => {
                    if attempt >= self.settings.max_attempts {
                        return Err(err);
                    }
                    let delay = self.settings.backoff_factor * 2u32.pow(attempt - 1);
                    pipeline_warn!(
                        "fetch attempt {attempt}/{} for {url} failed ({err}), retrying in {delay:?}",
                        self.settings.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

enum Attempt {
    /// Transport failure or retryable status; worth another attempt.
    Transient(FetchError),
    Fatal(FetchError),
}

fn classify_transport(err: reqwest::Error) -> Attempt {
    if err.is_timeout() {
        return Attempt::Transient(FetchError::Timeout(err.to_string()));
    }
    if err.is_redirect() {
        return Attempt::Fatal(FetchError::RedirectLimit(err.to_string()));
    }
    Attempt::Transient(FetchError::Network(err.to_string()))
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}
