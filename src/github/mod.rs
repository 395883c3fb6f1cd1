//! GitHub repository stats: stars and the date of the most recent commit.
//!
//! Every lookup ends in a [`StatsOutcome`]. Missing, private, empty and
//! rate-limited repositories are ordinary results here, not errors.

mod client;
mod reference;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use client::GitHubStats;
pub use reference::{RepoReference, resolve_reference};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Popularity and activity of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStats {
    pub stars: u64,
    pub last_commit: DateTime<Utc>,
}

impl RepoStats {
    /// Fractional days elapsed between the last commit and `now`, never negative.
    pub fn days_since_commit(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.last_commit).num_milliseconds() as f64 / 1000.0;
        (seconds / SECONDS_PER_DAY).max(0.0)
    }
}

/// Result of looking up one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsOutcome {
    Found(RepoStats),
    /// HTTP 404: deleted, renamed away or private.
    NotFound,
    /// HTTP 401/403/429, usually rate limiting.
    Forbidden,
    /// The repository has no commits.
    Empty,
    /// Network failure, 5xx, or an unreadable body. Worth retrying later.
    TransientError(String),
}

impl StatsOutcome {
    pub fn stats(&self) -> Option<&RepoStats> {
        match self {
            StatsOutcome::Found(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, StatsOutcome::Found(_))
    }
}

/// Anything that can look up repository stats.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Look up one repository. Never fails: every problem is an outcome.
    async fn fetch_stats(&self, reference: &RepoReference) -> StatsOutcome;
}
