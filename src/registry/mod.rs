//! MCP server registry client.
//!
//! Walks the cursor-paginated listing until the registry stops handing out a
//! cursor. Any failed or malformed page aborts the whole walk: a registry with
//! holes in it would bias every statistic computed downstream.

mod page;

use std::collections::HashSet;

use log::{debug, info};

use crate::error::PipelineError;
use crate::http::HttpClient;
use crate::progress::{Progress, ProgressCallback, emit};

pub use page::{RegistryPage, parse_page};

/// Number of servers requested per page.
pub const PAGE_SIZE: usize = 100;

/// One server listed in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    name: String,
    version: String,
    repository_url: Option<String>,
}

impl RegistryEntry {
    pub fn new(name: &str, version: &str, repository_url: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            repository_url: repository_url
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.repository_url.as_deref()
    }
}

pub struct RegistryClient {
    http_client: HttpClient,
    base_url: String,
    page_size: usize,
}

impl RegistryClient {
    pub fn new(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.to_string(),
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches every entry in registry order.
    #[tracing::instrument(skip(self, on_progress))]
    pub async fn fetch_all_entries(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<RegistryEntry>, PipelineError> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();
        let mut page_number = 0;

        loop {
            page_number += 1;
            let page = self.fetch_page(page_number, cursor.as_deref()).await?;
            let count = page.entries.len();
            entries.extend(page.entries);

            debug!(
                "Registry page {}: {} entries ({} total)",
                page_number,
                count,
                entries.len()
            );
            emit(
                on_progress,
                Progress::RegistryPage {
                    page: page_number,
                    count,
                    total_so_far: entries.len(),
                },
            );

            match page.next_cursor {
                None => break,
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    return Err(PipelineError::Schema {
                        page: page_number,
                        reason: format!("cursor '{}' was returned twice", next),
                    });
                }
                Some(next) => cursor = Some(next),
            }
        }

        info!(
            "Fetched {} registry entries in {} page(s)",
            entries.len(),
            page_number
        );
        emit(
            on_progress,
            Progress::RegistryComplete {
                total: entries.len(),
            },
        );

        Ok(entries)
    }

    async fn fetch_page(
        &self,
        page_number: usize,
        cursor: Option<&str>,
    ) -> Result<RegistryPage, PipelineError> {
        let limit = self.page_size.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let body = self
            .http_client
            .get_text_with_query(&self.base_url, &query)
            .await
            .map_err(|e| PipelineError::RegistryUnavailable {
                page: page_number,
                reason: format!("{:#}", e),
            })?;

        parse_page(&body).map_err(|reason| PipelineError::Schema {
            page: page_number,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use reqwest::Client;
    use std::sync::{Arc, Mutex};

    fn client_for(server: &mockito::Server) -> RegistryClient {
        let http = HttpClient::new(Client::new()).with_retry_policy(RetryPolicy::no_retry());
        RegistryClient::new(http, &format!("{}/v0/servers", server.url())).with_page_size(2)
    }

    fn page_body(names: &[&str], cursor: Option<&str>) -> String {
        let servers: Vec<serde_json::Value> = names
            .iter()
            .map(|n| {
                serde_json::json!({
                    "server": {
                        "name": n,
                        "version": "1.0.0",
                        "repository": {"url": format!("https://github.com/acme/{}", n), "source": "github"}
                    }
                })
            })
            .collect();
        let mut metadata = serde_json::json!({"count": names.len()});
        if let Some(c) = cursor {
            metadata["nextCursor"] = serde_json::json!(c);
        }
        serde_json::json!({"servers": servers, "metadata": metadata}).to_string()
    }

    #[tokio::test]
    async fn test_fetch_all_entries_walks_every_page() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(page_body(&["a", "b"], Some("c1")))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v0/servers?limit=2&cursor=c1")
            .with_status(200)
            .with_body(page_body(&["c", "d"], Some("c2")))
            .expect(1)
            .create_async()
            .await;
        let third = server
            .mock("GET", "/v0/servers?limit=2&cursor=c2")
            .with_status(200)
            .with_body(page_body(&["e"], None))
            .expect(1)
            .create_async()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event));

        let entries = client_for(&server)
            .fetch_all_entries(Some(&callback))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;

        let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[2],
            Progress::RegistryPage {
                page: 3,
                count: 1,
                total_so_far: 5
            }
        );
        assert_eq!(events[3], Progress::RegistryComplete { total: 5 });
    }

    #[tokio::test]
    async fn test_single_page_registry() {
        let mut server = mockito::Server::new_async().await;
        let only = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(page_body(&["solo"], None))
            .expect(1)
            .create_async()
            .await;

        let entries = client_for(&server).fetch_all_entries(None).await.unwrap();

        only.assert_async().await;
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_the_walk() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(page_body(&["a", "b"], Some("c1")))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/v0/servers?limit=2&cursor=c1")
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server).fetch_all_entries(None).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::RegistryUnavailable { page: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_page_is_a_schema_error() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(r#"{"servers": [{"server": {"name": "no-version"}}], "metadata": {}}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_all_entries(None).await.unwrap_err();

        assert!(matches!(err, PipelineError::Schema { page: 1, .. }));
    }

    #[tokio::test]
    async fn test_repeating_cursor_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(page_body(&["a"], Some("loop")))
            .create_async()
            .await;
        let _again = server
            .mock("GET", "/v0/servers?limit=2&cursor=loop")
            .with_status(200)
            .with_body(page_body(&["b"], Some("loop")))
            .create_async()
            .await;

        let err = client_for(&server).fetch_all_entries(None).await.unwrap_err();

        assert!(matches!(err, PipelineError::Schema { page: 2, .. }));
    }

    #[tokio::test]
    async fn test_cursor_cycle_across_pages_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/v0/servers?limit=2")
            .with_status(200)
            .with_body(page_body(&["a"], Some("A")))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/v0/servers?limit=2&cursor=A")
            .with_status(200)
            .with_body(page_body(&["b"], Some("B")))
            .create_async()
            .await;
        let back = server
            .mock("GET", "/v0/servers?limit=2&cursor=B")
            .with_status(200)
            .with_body(page_body(&["c"], Some("A")))
            .expect(1)
            .create_async()
            .await;

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client_for(&server).fetch_all_entries(None),
        )
        .await
        .expect("cursor cycle must terminate");

        back.assert_async().await;
        assert!(matches!(result, Err(PipelineError::Schema { page: 3, .. })));
    }

    #[test]
    fn test_registry_entry_new_drops_blank_url() {
        let entry = RegistryEntry::new("x", "1", Some(""));
        assert_eq!(entry.repository_url(), None);
    }
}
