//! Upstream HTTP client with rate-limit aware retry.
//!
//! This module performs single parameterized GET requests against the New York
//! Times API and classifies the outcome into parsed JSON or an [`NytError`].
//!
//! # Architecture
//!
//! - [`Transport`]: one raw GET, no retry, no interpretation of the status
//! - [`ReqwestTransport`]: the production [`Transport`] backed by `reqwest`
//! - [`UpstreamClient`]: the retry loop and response classification
//!
//! # Retry Strategy
//!
//! Only HTTP 429 is retried. Attempt `n` (0-indexed) that is throttled waits
//! `2 * (n + 1)` backoff units before the next attempt:
//!
//! ```text
//! attempt 0 -> 429 -> wait 2 units
//! attempt 1 -> 429 -> wait 4 units
//! attempt 2 -> 429 -> RateLimitExceeded (max_retries = 3)
//! ```
//!
//! Any other status is final on first sight.

use crate::error::NytError;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Ordered query parameters for one upstream request.
pub type QueryParams = Vec<(&'static str, String)>;

/// Status and body of one upstream response, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// A single HTTP GET with query parameters.
///
/// Implementations must not retry; they return whatever status the server sent
/// and only fail with [`NytError::Unavailable`] when no response could be read.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, params: &[(&'static str, String)]) -> Result<RawResponse, NytError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, params: &[(&'static str, String)]) -> Result<RawResponse, NytError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| NytError::unavailable(url, e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NytError::unavailable(url, e.without_url()))?;
        Ok(RawResponse { status, body })
    }
}

/// Retrying client for the NYT API.
#[derive(Clone)]
pub struct UpstreamClient {
    transport: Arc<dyn Transport>,
    /// Total attempts per request, including the first.
    max_retries: u32,
    /// One backoff unit; the Nth retry waits `2 * (N + 1)` of these.
    backoff_unit: Duration,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("max_retries", &self.max_retries)
            .field("backoff_unit", &self.backoff_unit)
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(transport: Arc<dyn Transport>, max_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            transport,
            max_retries,
            backoff_unit,
        }
    }

    /// Delay before the attempt following throttled attempt `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(attempt.saturating_add(1).saturating_mul(2))
    }

    /// GET `url` with `params` and return the parsed JSON body.
    ///
    /// # Errors
    ///
    /// - [`NytError::RateLimitExceeded`] if every attempt was answered with 429
    /// - [`NytError::Upstream`] on the first non-2xx, non-429 status
    /// - [`NytError::Unavailable`] on transport failure or a non-JSON 2xx body
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &str, params: &[(&'static str, String)]) -> Result<Value, NytError> {
        let total_t0 = Instant::now();

        for attempt in 0..self.max_retries {
            let attempt_t0 = Instant::now();
            let resp = self.transport.get(url, params).await.inspect_err(|e| {
                error!(
                    attempt,
                    elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                    error = %e,
                    "Upstream request failed"
                );
            })?;

            if resp.status == StatusCode::TOO_MANY_REQUESTS {
                if attempt + 1 == self.max_retries {
                    break;
                }
                let delay = self.backoff_delay(attempt);
                warn!(
                    attempt,
                    max = self.max_retries,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    ?delay,
                    "Upstream throttled; backing off"
                );
                sleep(delay).await;
                continue;
            }

            if !resp.status.is_success() {
                warn!(
                    attempt,
                    status = resp.status.as_u16(),
                    body = %truncate_for_log(&resp.body, 300),
                    "Upstream returned error status"
                );
                return Err(NytError::Upstream {
                    url: url.to_string(),
                    status: resp.status.as_u16(),
                    message: upstream_message(&resp.body),
                });
            }

            let json = serde_json::from_str::<Value>(&resp.body).map_err(|e| {
                error!(
                    error = %e,
                    body = %truncate_for_log(&resp.body, 300),
                    "Upstream returned undecodable body"
                );
                NytError::unavailable(url, format!("malformed JSON body: {e}"))
            })?;

            info!(
                attempt,
                bytes = resp.body.len(),
                elapsed_ms_total = total_t0.elapsed().as_millis(),
                "Upstream request succeeded"
            );
            return Ok(json);
        }

        error!(
            attempts = self.max_retries,
            elapsed_ms_total = total_t0.elapsed().as_millis(),
            "Upstream rate limit exhausted retries"
        );
        Err(NytError::RateLimitExceeded {
            url: url.to_string(),
            attempts: self.max_retries,
        })
    }
}

/// Pull a readable message out of an upstream error body.
///
/// The NYT gateway answers errors as `{"fault": {"faultstring": ...}}`, while
/// the APIs themselves use `{"message": ...}` or `{"errors": [...]}`.
fn upstream_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.pointer("/fault/faultstring")
            .or_else(|| v.get("message"))
            .or_else(|| v.pointer("/errors/0"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let message = from_json.unwrap_or_else(|| truncate_for_log(body.trim(), 200));
    debug!(%message, "Extracted upstream error message");
    message
}
