//! HTTP client wrapper for streaming downloads.
//!
//! This module provides the `HttpClient` struct which sends GET requests with
//! the download user agent and fixed timeouts, retrying transient connection
//! failures with exponential backoff.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::interrupt::InterruptFlag;
use crate::user_agent;

/// HTTP client for downloading files with streaming support.
///
/// Created once per run and reused for every link, taking advantage of
/// connection pooling. Each call to [`get`](Self::get) starts with a fresh
/// retry allowance.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts and retry policy.
    ///
    /// Default configuration:
    /// - Connect timeout: 60 seconds
    /// - Read timeout: 60 seconds between body reads
    /// - Retries: 10, backoff 2s, 4s, 8s, ...
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::default())
    }

    /// Creates a new HTTP client with default timeouts and a custom retry policy.
    ///
    /// # Panics
    ///
    /// Same as [`new`](Self::new).
    #[must_use]
    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, retry_policy)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
        retry_policy: RetryPolicy,
    ) -> Self {
        let client = build_client(connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            retry_policy,
        }
    }

    /// Returns the retry policy applied to each request.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Sends a GET request, retrying connection errors and timeouts.
    ///
    /// The response body is not read; callers stream it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - the server returns an error status (never retried)
    /// - connection errors or timeouts persist after every retry
    /// - `interrupt` is raised before a response arrives
    #[instrument(skip(self, interrupt), fields(url = %url))]
    pub async fn get(
        &self,
        url: &str,
        interrupt: &InterruptFlag,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut attempt: u32 = 1;
        loop {
            let result = tokio::select! {
                biased;
                () = interrupt.raised() => return Err(DownloadError::interrupted(url)),
                result = self.send_once(url) => result,
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match self.retry_policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "request failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        () = interrupt.raised() => return Err(DownloadError::interrupted(url)),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, "giving up");
                    return Err(error);
                }
            }
        }
    }

    async fn send_once(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

fn build_client(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::DOWNLOAD_USER_AGENT)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_default_uses_default_retry_policy() {
        let client = HttpClient::new();
        assert_eq!(client.retry_policy().max_retries(), 10);
    }

    #[test]
    fn test_http_client_custom_retry_policy() {
        let client = HttpClient::with_retry_policy(RetryPolicy::with_max_retries(2));
        assert_eq!(client.retry_policy().max_retries(), 2);
    }

    #[tokio::test]
    async fn test_get_returns_interrupted_when_flag_already_raised() {
        let client = HttpClient::new();
        let interrupt = InterruptFlag::new();
        interrupt.raise();

        let error = client
            .get("http://127.0.0.1:9/never", &interrupt)
            .await
            .unwrap_err();
        assert!(error.is_interrupted(), "got: {error:?}");
    }
}
