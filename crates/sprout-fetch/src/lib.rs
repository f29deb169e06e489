//! Registry HTTP transport with connection pooling and retry logic.
//!
//! One `FetchFromRegistry` instance is built per client and shared by every
//! fetcher and the resolver. Each request carries an optional auth header
//! supplied by the caller; retry, timeout, and user-agent policy live here
//! and nowhere else.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;

use sprout_core::{SproutError, SproutResult};

/// User agent sent when the caller does not configure one
pub const DEFAULT_USER_AGENT: &str = concat!("sprout/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Caller-facing transport configuration
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Retry policy, defaulted when absent
    pub retry: Option<RetryPolicy>,
    /// Per-request timeout, defaulted when absent
    pub timeout: Option<Duration>,
    /// User agent string, defaulted when absent
    pub user_agent: Option<String>,
}

/// HTTP transport for registry and tarball requests
#[derive(Debug, Clone)]
pub struct FetchFromRegistry {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry policy applied to every operation
    retry: RetryPolicy,
}

impl FetchFromRegistry {
    /// Build a pooled transport from caller options
    pub fn new(opts: TransportOptions) -> SproutResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(opts.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .user_agent(
                opts.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()
            .map_err(|e| SproutError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            retry: opts.retry.unwrap_or_default(),
        })
    }

    /// Fetch and deserialize a JSON document.
    ///
    /// `auth_header` is sent as the `Authorization` header when present;
    /// `accept` overrides the `Accept` header (registries serve abbreviated
    /// documents for `application/vnd.npm.install-v1+json`).
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        auth_header: Option<&str>,
        accept: Option<&str>,
    ) -> SproutResult<T> {
        self.with_retry(url, || async {
            let response = self.send_get(url, auth_header, accept).await?;
            response.json::<T>().await.map_err(|e| {
                SproutError::network(format!("Failed to parse response from {url}"), e)
            })
        })
        .await
    }

    /// Download a response body as raw bytes
    pub async fn get_bytes(&self, url: &str, auth_header: Option<&str>) -> SproutResult<Vec<u8>> {
        self.with_retry(url, || async {
            let response = self.send_get(url, auth_header, None).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| SproutError::network(format!("Failed to read body from {url}"), e))?;
            Ok(bytes.to_vec())
        })
        .await
    }

    async fn send_get(
        &self,
        url: &str,
        auth_header: Option<&str>,
        accept: Option<&str>,
    ) -> SproutResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        if let Some(header) = auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SproutError::network(format!("Request to {url} failed"), e))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(SproutError::NotFound {
                url: url.to_string(),
            }),
            status => Err(SproutError::Network {
                message: format!("Request to {url} returned status {status}"),
                source: None,
            }),
        }
    }

    /// Execute an operation with exponential backoff retry
    async fn with_retry<F, Fut, T>(&self, url: &str, operation: F) -> SproutResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = SproutResult<T>>,
    {
        let mut delay = self.retry.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    let recoverable = error.is_recoverable();
                    last_error = Some(error);

                    if attempt == self.retry.max_retries || !recoverable {
                        break;
                    }

                    tracing::debug!(url, attempt, ?delay, "retrying registry request");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry.multiplier) as u64,
                        ),
                        self.retry.max_delay,
                    );
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SproutError::Network {
            message: format!("Request to {url} failed without error"),
            source: None,
        }))
    }
}

#[cfg(test)]
mod tests;
