//! Retry policy and classification of HTTP failures.

use std::time::Duration;

use reqwest::{Response, StatusCode};

/// Maximum number of attempts for a single request.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Header GitHub uses to report the remaining request budget.
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// How often and how patiently a transient failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting. Used by tests and by callers that do their own retrying.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Failures that will not go away by asking again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonRetryableError {
    /// Rate limit exceeded (HTTP 403 with an exhausted budget, or 429)
    RateLimitExceeded(String),
    /// Authentication failed (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 non-rate-limit)
    Forbidden(String),
    /// Resource exists but is in a conflicting state (HTTP 409, e.g. an empty repository)
    Conflict(String),
    /// Other client errors that won't succeed on retry
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Lower --max-concurrent or set GITHUB_TOKEN.",
                    msg
                )
            }
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your GITHUB_TOKEN.", msg)
            }
            NonRetryableError::NotFound(msg) => write!(f, "Not found: {}", msg),
            NonRetryableError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}. You may need authentication.", msg)
            }
            NonRetryableError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            NonRetryableError::ClientError(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies a non-success status.
/// Returns Ok(()) if the failure is worth retrying (5xx and anything unrecognised).
pub fn classify_status(
    status: StatusCode,
    rate_limit_exhausted: bool,
) -> Result<(), NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN if rate_limit_exhausted => Err(
            NonRetryableError::RateLimitExceeded("GitHub API rate limit exceeded".to_string()),
        ),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(
            "Access to this resource is forbidden".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            "The requested resource was not found".to_string(),
        )),
        StatusCode::CONFLICT => Err(NonRetryableError::Conflict(
            "The resource is in a conflicting state".to_string(),
        )),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        _ => Ok(()),
    }
}

/// Passes a successful response through, or turns a failed one into an error.
/// Non-retryable statuses become a [`NonRetryableError`]; the rest keep the reqwest error.
pub fn check_response(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let exhausted = response
        .headers()
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    match classify_status(status, exhausted) {
        Err(non_retryable) => Err(anyhow::Error::from(non_retryable)),
        Ok(()) => response.error_for_status().map_err(anyhow::Error::from),
    }
}
