use std::time::Duration;

use fetch_logging::{fetch_debug, fetch_info, fetch_warn};
use fetcher_core::parse_lines;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Url;

use crate::types::map_reqwest_error;
use crate::{FailureKind, FetchError};

pub const DEFAULT_ARCHIVE_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Upper bound on a server-requested pause between attempts.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// CDX search endpoint.
    pub endpoint: String,
    /// Limit for a single request, independent of retries.
    pub request_timeout: Duration,
    /// Attempts in total, including the first one.
    pub max_attempts: u32,
    /// Pause before the second attempt; doubles on every further attempt.
    pub backoff_base: Duration,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ARCHIVE_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(10),
            max_attempts: 5,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Source of historical URLs for a domain.
#[async_trait::async_trait]
pub trait ArchiveIndex: Send + Sync {
    async fn fetch(&self, domain: &str) -> Result<Vec<String>, FetchError>;
}

/// Queries a Wayback Machine style CDX index for every URL seen under a domain.
#[derive(Debug, Clone)]
pub struct CdxArchiveClient {
    settings: ArchiveSettings,
    client: reqwest::Client,
}

impl CdxArchiveClient {
    pub fn new(settings: ArchiveSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("filefetcher/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl ArchiveIndex for CdxArchiveClient {
    async fn fetch(&self, domain: &str) -> Result<Vec<String>, FetchError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(FetchError::new(FailureKind::InvalidInput, "empty domain"));
        }
        let url = query_url(&self.settings.endpoint, domain)?;
        let max_attempts = self.settings.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            fetch_debug!("Archive query domain={} attempt={}", domain, attempt);

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if status.is_success() {
                let body = response.text().await.map_err(map_reqwest_error)?;
                let urls = parse_lines(&body);
                fetch_info!("Archive returned {} URLs for {}", urls.len(), domain);
                return Ok(urls);
            }

            let code = status.as_u16();
            if !FailureKind::is_transient_status(code) {
                return Err(FetchError::new(
                    FailureKind::HttpStatus(code),
                    status.to_string(),
                ));
            }
            if attempt >= max_attempts {
                return Err(FetchError::new(
                    FailureKind::RetriesExhausted {
                        attempts: attempt,
                        last_status: code,
                    },
                    status.to_string(),
                ));
            }

            let delay = retry_delay(
                backoff_delay(self.settings.backoff_base, attempt),
                retry_after(response.headers()),
            );
            fetch_warn!(
                "Archive answered {} for {}; retrying in {:?} ({}/{})",
                code,
                domain,
                delay,
                attempt,
                max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn query_url(endpoint: &str, domain: &str) -> Result<Url, FetchError> {
    let pattern = format!("*.{domain}/*");
    Url::parse_with_params(
        endpoint,
        &[
            ("url", pattern.as_str()),
            ("collapse", "urlkey"),
            ("output", "text"),
            ("fl", "original"),
        ],
    )
    .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
}

/// Pause after failed attempt number `attempt` (1-based).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor)
}

/// Delta-seconds form of `Retry-After`; HTTP dates are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// The longer of our own backoff and the server's request, the latter capped.
fn retry_delay(backoff: Duration, requested: Option<Duration>) -> Duration {
    match requested {
        Some(requested) => backoff.max(requested.min(MAX_RETRY_AFTER)),
        None => backoff,
    }
}
