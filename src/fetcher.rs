//! HTTP fetching of index and article pages.
//!
//! One [`Fetcher`] is built per run and owns a pooled `reqwest::Client`, so
//! every request of the run shares connections. The client is released when
//! the fetcher is dropped, on success and on every early return alike.
//!
//! Each URL gets exactly one attempt. Failures are logged here and reported
//! to callers as `None`.

use crate::error::{ConfigError, FetchError};
use reqwest::{Client, header};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser-like identification sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Single-attempt HTML fetcher with a bounded timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    ///
    /// With `system_proxy` off, proxy variables in the environment are
    /// ignored and every request connects directly.
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        system_proxy: bool,
    ) -> Result<Self, ConfigError> {
        let value = header::HeaderValue::from_str(user_agent)
            .map_err(|_| ConfigError::UserAgent(user_agent.to_string()))?;
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, value);

        let mut builder = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout);
        if !system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Fetcher { client })
    }

    /// GET `url` and return the body text of a 2xx response.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), %status, "Fetched page");
        Ok(body)
    }

    /// GET `url` and parse it into a document, or log and return `None`.
    pub async fn fetch(&self, url: &str) -> Option<Html> {
        match self.fetch_text(url).await {
            Ok(body) => Some(Html::parse_document(&body)),
            Err(e) => {
                error!(%url, error = %e, "Fetch failed");
                None
            }
        }
    }
}
