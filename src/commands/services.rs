//! Service factory for building run dependencies.
//!
//! Both clients share one HTTP client, so the credential and retry policy
//! are configured in a single place.

use anyhow::Result;

use crate::config::Config;
use crate::github::GitHubStats;
use crate::http::build_http_client;
use crate::registry::RegistryClient;

pub struct Services {
    pub registry: RegistryClient,
    pub stats: GitHubStats,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = build_http_client(config.token.as_deref(), config.retry)?;
        Ok(Self {
            registry: RegistryClient::new(http_client.clone(), &config.registry_url),
            stats: GitHubStats::new(http_client, &config.api_url),
        })
    }
}
