//! GitHub REST implementation of [`StatsSource`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::http::{HttpClient, NonRetryableError};

use super::{RepoReference, RepoStats, StatsOutcome, StatsSource};

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct RepoInfo {
        pub stargazers_count: u64,
    }

    #[derive(Deserialize, Debug)]
    pub struct Commit {
        pub commit: CommitDetail,
    }

    #[derive(Deserialize, Debug)]
    pub struct CommitDetail {
        pub author: Option<Signature>,
        pub committer: Option<Signature>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Signature {
        pub date: String,
    }
}

pub struct GitHubStats {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubStats {
    pub fn new(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_repo_info(&self, reference: &RepoReference) -> Result<api::RepoInfo> {
        let url = format!(
            "{}/repos/{}/{}",
            self.api_url, reference.owner, reference.repo
        );
        debug!("Fetching repo info from {}...", url);
        self.http_client.get_json_with_query(&url, &[]).await
    }

    async fn fetch_latest_commit(&self, reference: &RepoReference) -> Result<Vec<api::Commit>> {
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.api_url, reference.owner, reference.repo
        );
        debug!("Fetching latest commit from {}...", url);
        self.http_client
            .get_json_with_query(&url, &[("per_page", "1")])
            .await
    }

    async fn lookup(&self, reference: &RepoReference) -> Result<StatsOutcome> {
        let info = self.fetch_repo_info(reference).await?;
        let commits = self.fetch_latest_commit(reference).await?;

        let Some(latest) = commits.into_iter().next() else {
            return Ok(StatsOutcome::Empty);
        };

        let Some(date) = latest
            .commit
            .author
            .or(latest.commit.committer)
            .map(|s| s.date)
        else {
            return Ok(StatsOutcome::TransientError(
                "latest commit carries no date".to_string(),
            ));
        };

        let last_commit = match DateTime::parse_from_rfc3339(&date) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(e) => {
                return Ok(StatsOutcome::TransientError(format!(
                    "unparseable commit date '{}': {}",
                    date, e
                )));
            }
        };

        Ok(StatsOutcome::Found(RepoStats {
            stars: info.stargazers_count,
            last_commit,
        }))
    }
}

/// Maps a failed lookup onto the outcome taxonomy.
fn outcome_for_error(error: &anyhow::Error) -> StatsOutcome {
    match error.downcast_ref::<NonRetryableError>() {
        Some(NonRetryableError::NotFound(_)) => StatsOutcome::NotFound,
        Some(
            NonRetryableError::Forbidden(_)
            | NonRetryableError::RateLimitExceeded(_)
            | NonRetryableError::AuthenticationFailed(_),
        ) => StatsOutcome::Forbidden,
        Some(NonRetryableError::Conflict(_)) => StatsOutcome::Empty,
        Some(NonRetryableError::ClientError(msg)) => StatsOutcome::TransientError(msg.clone()),
        None => StatsOutcome::TransientError(format!("{:#}", error)),
    }
}

#[async_trait]
impl StatsSource for GitHubStats {
    #[tracing::instrument(skip(self), fields(repo = %reference))]
    async fn fetch_stats(&self, reference: &RepoReference) -> StatsOutcome {
        let outcome = match self.lookup(reference).await {
            Ok(outcome) => outcome,
            Err(e) => outcome_for_error(&e),
        };
        debug!("{}: {:?}", reference, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use chrono::TimeZone;
    use reqwest::Client;

    fn stats_for(server: &mockito::Server) -> GitHubStats {
        let http = HttpClient::new(Client::new()).with_retry_policy(RetryPolicy::no_retry());
        GitHubStats::new(http, &server.url())
    }

    fn reference() -> RepoReference {
        RepoReference {
            owner: "acme".into(),
            repo: "tool".into(),
        }
    }

    #[tokio::test]
    async fn test_found() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"stargazers_count": 100, "default_branch": "main"}"#)
            .create_async()
            .await;
        let _commits = server
            .mock("GET", "/repos/acme/tool/commits?per_page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"sha": "abc", "commit": {"author": {"name": "a", "date": "2025-01-02T03:04:05Z"},
                                               "committer": {"date": "2025-01-03T00:00:00Z"}}}]"#,
            )
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert_eq!(
            outcome,
            StatsOutcome::Found(RepoStats {
                stars: 100,
                last_commit: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            })
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(404)
            .create_async()
            .await;
        let commits = server
            .mock("GET", "/repos/acme/tool/commits?per_page=1")
            .expect(0)
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert_eq!(outcome, StatsOutcome::NotFound);
        commits.assert_async().await;
    }

    #[tokio::test]
    async fn test_forbidden() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert_eq!(outcome, StatsOutcome::Forbidden);
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(200)
            .with_body(r#"{"stargazers_count": 7}"#)
            .create_async()
            .await;
        let _commits = server
            .mock("GET", "/repos/acme/tool/commits?per_page=1")
            .with_status(409)
            .with_body(r#"{"message": "Git Repository is empty."}"#)
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert_eq!(outcome, StatsOutcome::Empty);
    }

    #[tokio::test]
    async fn test_empty_commit_list() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(200)
            .with_body(r#"{"stargazers_count": 7}"#)
            .create_async()
            .await;
        let _commits = server
            .mock("GET", "/repos/acme/tool/commits?per_page=1")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert_eq!(outcome, StatsOutcome::Empty);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(502)
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert!(matches!(outcome, StatsOutcome::TransientError(_)));
    }

    #[tokio::test]
    async fn test_commit_failure_drops_the_stars_too() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(200)
            .with_body(r#"{"stargazers_count": 42}"#)
            .create_async()
            .await;
        let _commits = server
            .mock("GET", "/repos/acme/tool/commits?per_page=1")
            .with_status(500)
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert!(matches!(outcome, StatsOutcome::TransientError(_)));
        assert_eq!(outcome.stats(), None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let _repo = server
            .mock("GET", "/repos/acme/tool")
            .with_status(200)
            .with_body(r#"{"stars": "many"}"#)
            .create_async()
            .await;

        let outcome = stats_for(&server).fetch_stats(&reference()).await;

        assert!(matches!(outcome, StatsOutcome::TransientError(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let http = HttpClient::new(Client::new()).with_retry_policy(RetryPolicy::no_retry());
        let stats = GitHubStats::new(http, "http://127.0.0.1:1");

        let outcome = stats.fetch_stats(&reference()).await;

        assert!(matches!(outcome, StatsOutcome::TransientError(_)));
    }

    #[test]
    fn test_outcome_for_error() {
        let err = anyhow::Error::from(NonRetryableError::AuthenticationFailed("x".into()));
        assert_eq!(outcome_for_error(&err), StatsOutcome::Forbidden);

        let err = anyhow::Error::from(NonRetryableError::Conflict("x".into()));
        assert_eq!(outcome_for_error(&err), StatsOutcome::Empty);

        let err = anyhow::anyhow!("connection reset");
        assert!(matches!(
            outcome_for_error(&err),
            StatsOutcome::TransientError(_)
        ));
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let http = HttpClient::new(Client::new());
        let stats = GitHubStats::new(http, "https://api.github.com/");
        assert_eq!(stats.api_url, "https://api.github.com");
    }
}
