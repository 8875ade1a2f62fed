use std::time::Duration;

use fetch_logging::fetch_debug;
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::types::map_reqwest_error;
use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    /// A redirect is not proof that the resource itself exists, so it is off by default.
    pub follow_redirects: bool,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            follow_redirects: false,
            user_agent: concat!("filefetcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The HTTP client behind [`HeadProbe`] could not be built from its settings.
#[derive(Debug, Error)]
#[error("probe client setup failed: {0}")]
pub struct ProbeClientError(#[source] reqwest::Error);

/// Existence check for a single URL. An unreachable resource is an expected
/// outcome, so implementations answer `false` instead of failing.
#[async_trait::async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self, url: &str) -> bool;
}

/// Probes with an HTTP HEAD request; only `200 OK` counts as alive.
#[derive(Debug, Clone)]
pub struct HeadProbe {
    client: reqwest::Client,
}

impl HeadProbe {
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeClientError> {
        let redirect = if settings.follow_redirects {
            reqwest::redirect::Policy::limited(5)
        } else {
            reqwest::redirect::Policy::none()
        };
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .redirect(redirect)
            .build()
            .map_err(ProbeClientError)?;
        Ok(Self { client })
    }

    async fn head_status(&self, url: &str) -> Result<StatusCode, FetchError> {
        let parsed = Url::parse(url.trim())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("unsupported scheme {}", parsed.scheme()),
            ));
        }
        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Ok(response.status())
    }
}

#[async_trait::async_trait]
impl LivenessProbe for HeadProbe {
    async fn check(&self, url: &str) -> bool {
        match self.head_status(url).await {
            Ok(status) if status == StatusCode::OK => true,
            Ok(status) => {
                fetch_debug!("Probe {} answered {}", url, status.as_u16());
                false
            }
            Err(err) => {
                fetch_debug!("Probe {} failed: {}", url, err);
                false
            }
        }
    }
}
