//! Validated settings for a run.

use std::num::NonZeroUsize;

use log::debug;
use url::Url;

use crate::error::PipelineError;
use crate::http::RetryPolicy;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.modelcontextprotocol.io/v0/servers";
pub const DEFAULT_MAX_CONCURRENT: usize = 10;
/// Upper bound on concurrent GitHub requests; beyond this the secondary rate limits kick in.
pub const MAX_CONCURRENT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub registry_url: String,
    pub token: Option<String>,
    pub max_concurrent: NonZeroUsize,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new(
        max_concurrent: usize,
        token: Option<String>,
        api_url: Option<String>,
        registry_url: Option<String>,
    ) -> Result<Self, PipelineError> {
        let max_concurrent = validate_concurrency(max_concurrent)?;
        let api_url = validate_url("api url", api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let registry_url = validate_url(
            "registry url",
            registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL),
        )?;
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        debug!(
            "Config: api={} registry={} max_concurrent={} token={}",
            api_url,
            registry_url,
            max_concurrent,
            if token.is_some() { "set" } else { "unset" }
        );

        Ok(Self {
            api_url,
            registry_url,
            token,
            max_concurrent,
            retry: RetryPolicy::default(),
        })
    }
}

fn validate_concurrency(value: usize) -> Result<NonZeroUsize, PipelineError> {
    if value > MAX_CONCURRENT_LIMIT {
        return Err(PipelineError::InvalidConfig(format!(
            "max concurrent requests must be between 1 and {}, got {}",
            MAX_CONCURRENT_LIMIT, value
        )));
    }
    NonZeroUsize::new(value).ok_or_else(|| {
        PipelineError::InvalidConfig(format!(
            "max concurrent requests must be between 1 and {}, got 0",
            MAX_CONCURRENT_LIMIT
        ))
    })
}

fn validate_url(what: &str, raw: &str) -> Result<String, PipelineError> {
    let parsed = Url::parse(raw)
        .map_err(|e| PipelineError::InvalidConfig(format!("{} '{}': {}", what, raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::InvalidConfig(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
