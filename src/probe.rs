//! Source URL reachability probe.
//!
//! The probe awaits a full network round trip, so it must only run from the
//! playlist engine's context and never inside the checker tick body, where it
//! would hold up every other scheduled pass.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Reachability probe for candidate source URLs.
#[async_trait]
pub trait UrlProber: Send + Sync {
    /// True only when the endpoint answers with HTTP 200 OK. Connection
    /// errors, timeouts, malformed URLs, and any other status are uniformly
    /// false; callers treat "not reachable" as one signal.
    async fn check(&self, url: &str) -> bool;
}

/// [`UrlProber`] backed by a shared reqwest client.
pub struct HttpUrlProber {
    client: reqwest::Client,
}

impl HttpUrlProber {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpUrlProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlProber for HttpUrlProber {
    async fn check(&self, url: &str) -> bool {
        let parsed = match url::Url::parse(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(url = %url, error = %error, "probe rejected malformed url");
                return false;
            }
        };

        match self.client.get(parsed).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(error) => {
                debug!(url = %url, error = %error, "probe request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_unreachable() {
        let prober = HttpUrlProber::new();
        assert!(!prober.check("not a url").await);
    }

    #[tokio::test]
    async fn unresolvable_host_is_unreachable() {
        let prober = HttpUrlProber::with_timeout(Duration::from_millis(500));
        assert!(!prober.check("http://stream.invalid/live.flv").await);
    }
}
