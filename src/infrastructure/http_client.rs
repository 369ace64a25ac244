//! HTTP client for registry fetching with rate limiting and error mapping
//!
//! One shared client serves all source adapters. Requests are throttled
//! with a global quota on top of the per-run inter-page delay, carry
//! explicit timeouts, and map transport failures onto the pipeline's
//! fetch-error taxonomy.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::sources::FetchError;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "jeju-dining-catalog/0.3".to_string(),
            timeout_seconds: crate::domain::constants::ingest::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: 5,
        }
    }
}

/// Rate-limited HTTP client shared by all source adapters
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    /// Fetches a URL and returns the response body, with optional extra
    /// headers (the map-search registry authenticates via a header).
    pub async fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(url, "fetching registry page");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(classify_transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("HTTP {status} from {url}")));
        }

        response
            .text()
            .await
            .map_err(classify_transport_error)
    }

    /// As [`Self::get_text`], but abandons the request when the token fires.
    /// Cancellation surfaces as a transient error; the aborted run is simply
    /// retried at the next schedule.
    pub async fn get_text_cancellable(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        cancellation: &CancellationToken,
    ) -> Result<String, FetchError> {
        tokio::select! {
            result = self.get_text(url, headers) => result,
            () = cancellation.cancelled() => {
                tracing::warn!(url, "fetch cancelled by shutdown");
                Err(FetchError::Transient("cancelled".to_string()))
            }
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() {
        FetchError::Transient(err.to_string())
    } else if err.is_decode() {
        FetchError::Schema(err.to_string())
    } else {
        FetchError::Transient(err.to_string())
    }
}
