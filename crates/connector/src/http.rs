//! Shared blocking HTTP client with retry, backoff and status
//! classification. Both the action client and the mapping client build
//! their requests through [`ApiClient`].

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::error::ConnectorError;

// ── Constants ───────────────────────────────────────────────────────

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("ledgerbridge/", env!("CARGO_PKG_VERSION"));

// ── Retry policy ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 = single attempt.
    pub max_retries: u32,
    /// Wait before the first retry; doubles after each retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries, initial_backoff: Duration::from_secs(1) }
    }

    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self { max_retries, initial_backoff: Duration::ZERO }
    }

    pub fn none() -> Self {
        Self::immediate(0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

// ── ApiClient ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    service: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(service: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, ConnectorError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectorError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, service: service.to_string(), retry })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Send with retry + exponential backoff. For idempotent requests.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured request (URL, auth, body).
    pub fn send_json(&self, build_request: impl Fn(&Client) -> RequestBuilder) -> Result<Value, ConnectorError> {
        self.execute(build_request, self.retry.max_retries)
    }

    /// Send exactly once. For requests that create records.
    pub fn send_json_once(&self, build_request: impl Fn(&Client) -> RequestBuilder) -> Result<Value, ConnectorError> {
        self.execute(build_request, 0)
    }

    fn execute(
        &self,
        build_request: impl Fn(&Client) -> RequestBuilder,
        max_retries: u32,
    ) -> Result<Value, ConnectorError> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;

        loop {
            let failure = match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() {
                        return read_json(resp, &self.service);
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        let wait = retry_after(&resp).unwrap_or(backoff);
                        let msg = extract_error(resp, status);
                        if attempt == max_retries {
                            let what = if status == 429 { "rate limited" } else { "upstream error" };
                            return Err(ConnectorError::Http(
                                status,
                                format!("{} {} after {} attempts: {}", self.service, what, attempt + 1, msg),
                            ));
                        }
                        (wait, format!("HTTP {}", status))
                    } else {
                        return Err(classify(status, extract_error(resp, status)));
                    }
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == max_retries {
                        return Err(ConnectorError::Network(format!(
                            "{} unreachable after {} attempts: {}",
                            self.service,
                            attempt + 1,
                            e
                        )));
                    }
                    (backoff, e.to_string())
                }
            };

            let (wait, reason) = failure;
            attempt += 1;
            log::warn!(
                "{}: retry {}/{} in {:?} ({})",
                self.service,
                attempt,
                max_retries,
                wait,
                reason
            );
            thread::sleep(wait);
            backoff *= 2;
        }
    }
}

fn classify(status: u16, msg: String) -> ConnectorError {
    match status {
        401 | 403 => ConnectorError::Unauthorized(status, msg),
        404 => ConnectorError::NotFound(msg),
        400 | 422 => ConnectorError::Validation(status, msg),
        _ => ConnectorError::Http(status, msg),
    }
}

fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// Read as text first so BOM-prefixed and empty bodies are handled.
fn read_json(resp: Response, service: &str) -> Result<Value, ConnectorError> {
    let text = resp
        .text()
        .map_err(|e| ConnectorError::Network(format!("failed to read {} response body: {}", service, e)))?;
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|e| {
        let end = trimmed.char_indices().nth(200).map_or(trimmed.len(), |(i, _)| i);
        ConnectorError::Parse(format!(
            "failed to parse {} JSON response: {} (body: {})",
            service,
            e,
            &trimmed[..end]
        ))
    })
}

/// Pull a human-readable message out of an error body: `message`, then
/// `error` (string or `{ message }`), then the raw text.
fn extract_error(resp: Response, status: u16) -> String {
    let text = resp.text().unwrap_or_default();
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
    body["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .or_else(|| body["error"]["message"].as_str())
        .map(str::to_string)
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| format!("HTTP {}", status))
}
