//! HTTP client module with retry logic and status classification.

mod client;
mod retry;

pub use client::{HttpClient, build_http_client};
pub use retry::{
    MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, RetryPolicy, check_response, classify_status,
};
