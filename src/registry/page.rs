//! Wire format of one registry listing page.

use super::RegistryEntry;

mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Page {
        pub servers: Vec<ServerEntry>,
        pub metadata: Metadata,
    }

    #[derive(Deserialize, Debug)]
    pub struct ServerEntry {
        pub server: ServerInfo,
    }

    #[derive(Deserialize, Debug)]
    pub struct ServerInfo {
        pub name: String,
        pub version: String,
        #[serde(default)]
        pub repository: Option<Repository>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Repository {
        #[serde(default)]
        pub url: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Metadata {
        #[serde(rename = "nextCursor", default)]
        pub next_cursor: Option<String>,
        #[serde(default)]
        pub count: Option<usize>,
    }
}

/// One decoded registry page.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryPage {
    pub entries: Vec<RegistryEntry>,
    pub next_cursor: Option<String>,
}

/// Decodes a page body. Any deviation from the expected shape is reported as
/// an error message; nothing is salvaged from a malformed page.
pub fn parse_page(body: &str) -> Result<RegistryPage, String> {
    let page: api::Page = serde_json::from_str(body).map_err(|e| e.to_string())?;

    if let Some(count) = page.metadata.count
        && count != page.servers.len()
    {
        return Err(format!(
            "metadata.count is {} but the page holds {} servers",
            count,
            page.servers.len()
        ));
    }

    let entries = page
        .servers
        .into_iter()
        .map(|s| RegistryEntry::from(s.server))
        .collect();

    let next_cursor = page.metadata.next_cursor.filter(|c| !c.is_empty());

    Ok(RegistryPage {
        entries,
        next_cursor,
    })
}

impl From<api::ServerInfo> for RegistryEntry {
    fn from(info: api::ServerInfo) -> Self {
        let repository = info.repository.unwrap_or_default();
        RegistryEntry {
            name: info.name,
            version: info.version,
            repository_url: repository
                .url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }
}
