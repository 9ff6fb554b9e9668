//! Retrying HTTP client
//!
//! Every outbound request follows the same discipline: a deadline from the
//! provider's configured timeout, conditional headers when an entity tag is
//! known, a fixed status-code mapping onto the error taxonomy, and retries
//! with exponential backoff (plus jitter) for transient failures only.
//! NotFound and RateLimit never retry.

use o8_domain::error::{Error, Result};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use o8_domain::constants::{
    HTTP_BACKOFF_BASE_MS, HTTP_BACKOFF_CAP_MS, HTTP_BACKOFF_JITTER, HTTP_RETRY_ATTEMPTS,
    HTTP_TIMEOUT_SECS,
};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Total deadline for a single request
    pub timeout: Duration,
    /// Retry attempts after the first try, transient failures only
    pub retry_attempts: u32,
    /// Base delay for exponential backoff
    pub backoff_base: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            retry_attempts: HTTP_RETRY_ATTEMPTS,
            backoff_base: Duration::from_millis(HTTP_BACKOFF_BASE_MS),
            user_agent: format!("o8/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Configuration with a custom timeout and retry budget
    pub fn new(timeout: Duration, retry_attempts: u32) -> Self {
        Self {
            timeout,
            retry_attempts,
            ..Default::default()
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Entity tag for `If-None-Match` revalidation
    pub etag: Option<String>,
    /// Bearer token for the `Authorization` header
    pub bearer_token: Option<String>,
}

/// A successful response body with its metadata
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Response body
    pub body: String,
    /// Entity tag from the response, if any
    pub etag: Option<String>,
    /// HTTP status code
    pub status: u16,
    /// Body size in bytes
    pub bytes: u64,
}

/// Outcome of a conditional fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Fresh body received
    Fetched(FetchedResponse),
    /// 304: the caller's cached version is still valid
    NotModified,
}

/// Coarse classification of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 304
    NotModified,
    /// 404
    NotFound,
    /// 401 or 403
    AuthFailed,
    /// 429
    RateLimited,
    /// 5xx, worth retrying
    ServerError,
    /// Everything else non-2xx
    Other,
}

/// Classify a status code per the shared error-mapping table
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        304 => StatusClass::NotModified,
        404 => StatusClass::NotFound,
        401 | 403 => StatusClass::AuthFailed,
        429 => StatusClass::RateLimited,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::Other,
    }
}

/// Backoff delay for a retry attempt: `base * 2^attempt` with 0-30% jitter,
/// capped at 60s
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let exp = base.as_millis() as u64 * 2u64.saturating_pow(attempt);
    let capped = exp.min(HTTP_BACKOFF_CAP_MS);
    let jitter = rand::rng().random_range(0.0..HTTP_BACKOFF_JITTER);
    Duration::from_millis((capped as f64 * (1.0 + jitter)).min(HTTP_BACKOFF_CAP_MS as f64) as u64)
}

/// HTTP client with deadline, conditional-request, and retry handling
pub struct RetryingClient {
    client: Client,
    config: HttpClientConfig,
    provider: String,
}

impl RetryingClient {
    /// Build a client for a provider
    pub fn new<S: Into<String>>(provider: S, config: HttpClientConfig) -> Result<Self> {
        let provider = provider.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::unavailable(&provider, format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            config,
            provider,
        })
    }

    /// Configured deadline
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// GET a URL with retries for transient failures
    pub async fn get(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome> {
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.config.retry_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt - 1, self.config.backoff_base);
                debug!(
                    provider = %self.provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            match self.get_once(url, options).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) if error.is_transient() => {
                    warn!(provider = %self.provider, url, %error, "transient HTTP failure");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(Error::unavailable(
            &self.provider,
            format!("retries exhausted for {url}: {detail}"),
        ))
    }

    async fn get_once(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome> {
        let mut request = self.client.get(url);
        if let Some(etag) = &options.etag {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }
        if let Some(token) = &options.bearer_token {
            request = request.bearer_auth(token);
        }

        // The client timeout already applies; the outer timeout guarantees a
        // deadline even when the connector stalls before the request starts.
        let response = tokio::time::timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| Error::timeout(&self.provider, format!("deadline exceeded for {url}")))?
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(&self.provider, format!("request to {url} timed out"))
                } else {
                    Error::unavailable(&self.provider, format!("request to {url} failed: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        match classify_status(status) {
            StatusClass::Success => {
                let etag = response
                    .headers()
                    .get(reqwest::header::ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.text().await.map_err(|e| {
                    Error::provider(&self.provider, format!("body read failed: {e}"))
                })?;
                let bytes = body.len() as u64;
                Ok(FetchOutcome::Fetched(FetchedResponse {
                    body,
                    etag,
                    status,
                    bytes,
                }))
            }
            StatusClass::NotModified => Ok(FetchOutcome::NotModified),
            StatusClass::NotFound => Err(Error::not_found(&self.provider, url)),
            StatusClass::AuthFailed => Err(Error::auth_failed(
                &self.provider,
                format!("{url} returned {status}"),
            )),
            StatusClass::RateLimited => {
                let retry_after_ms = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map_or(0, |secs| secs * 1000);
                Err(Error::rate_limit(&self.provider, retry_after_ms))
            }
            StatusClass::ServerError | StatusClass::Other => Err(Error::provider_status(
                &self.provider,
                format!("{url} returned {status}"),
                status,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_table() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(201), StatusClass::Success);
        assert_eq!(classify_status(304), StatusClass::NotModified);
        assert_eq!(classify_status(404), StatusClass::NotFound);
        assert_eq!(classify_status(401), StatusClass::AuthFailed);
        assert_eq!(classify_status(403), StatusClass::AuthFailed);
        assert_eq!(classify_status(429), StatusClass::RateLimited);
        assert_eq!(classify_status(500), StatusClass::ServerError);
        assert_eq!(classify_status(503), StatusClass::ServerError);
        assert_eq!(classify_status(418), StatusClass::Other);
    }

    #[test]
    fn backoff_grows_exponentially_within_bounds() {
        let base = Duration::from_millis(1000);
        for attempt in 0..4 {
            let expected_min = 1000u64 * 2u64.pow(attempt);
            let delay = backoff_delay(attempt, base).as_millis() as u64;
            assert!(delay >= expected_min, "attempt {attempt}: {delay}ms");
            // At most 30% over the exponential value
            assert!(delay <= (expected_min as f64 * 1.3) as u64 + 1);
        }
    }

    #[test]
    fn backoff_caps_at_sixty_seconds() {
        let delay = backoff_delay(12, Duration::from_millis(1000));
        assert!(delay <= Duration::from_secs(60));
    }
}
