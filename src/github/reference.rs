//! Turning repository links found in the registry into `owner/repo` pairs.

use std::fmt;

use url::Url;

const GITHUB_HOST: &str = "github.com";

/// A GitHub repository, as named in its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Resolves a repository link to a GitHub repository.
///
/// Accepts the shapes seen in the wild: with or without a scheme, `www.`,
/// `git+https://`, `git@github.com:owner/repo.git`, a `.git` suffix, and
/// trailing segments such as `/tree/main/server`. Anything that is not a
/// GitHub repository yields `None`.
pub fn resolve_reference(url: &str) -> Option<RepoReference> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let normalized = if let Some(rest) = url.strip_prefix("git@") {
        // scp-like syntax: git@github.com:owner/repo.git
        let (host, path) = rest.split_once(':')?;
        format!("https://{}/{}", host, path)
    } else if let Some(rest) = url.strip_prefix("git+") {
        rest.to_string()
    } else if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let parsed = Url::parse(&normalized).ok()?;
    if !matches!(parsed.scheme(), "http" | "https" | "git" | "ssh") {
        return None;
    }

    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host != GITHUB_HOST {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let raw_repo = segments.next()?;
    let repo = raw_repo.strip_suffix(".git").unwrap_or(raw_repo);

    if !is_valid_owner(owner) || !is_valid_repo(repo) {
        return None;
    }

    Some(RepoReference {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn is_valid_owner(owner: &str) -> bool {
    !owner.is_empty()
        && owner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        && !is_reserved_owner(owner)
}

fn is_valid_repo(repo: &str) -> bool {
    !repo.is_empty()
        && repo != "."
        && repo != ".."
        && repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// First path segments on github.com that are site pages, not users.
fn is_reserved_owner(owner: &str) -> bool {
    matches!(
        owner.to_lowercase().as_str(),
        "about"
            | "apps"
            | "collections"
            | "enterprise"
            | "explore"
            | "features"
            | "login"
            | "marketplace"
            | "notifications"
            | "orgs"
            | "pricing"
            | "search"
            | "settings"
            | "sponsors"
            | "topics"
            | "users"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(url: &str) -> Option<String> {
        resolve_reference(url).map(|r| r.to_string())
    }

    #[test]
    fn test_canonical_shapes() {
        assert_eq!(resolved("https://github.com/user/repo").as_deref(), Some("user/repo"));
        assert_eq!(resolved("https://github.com/user/repo.git").as_deref(), Some("user/repo"));
        assert_eq!(resolved("https://github.com/user/repo/").as_deref(), Some("user/repo"));
        assert_eq!(resolved("http://www.github.com/user/repo").as_deref(), Some("user/repo"));
        assert_eq!(resolved("github.com/user/repo").as_deref(), Some("user/repo"));
        assert_eq!(resolved("  https://GitHub.com/User/Repo  ").as_deref(), Some("User/Repo"));
    }

    #[test]
    fn test_trailing_segments_and_query() {
        assert_eq!(
            resolved("https://github.com/modelcontextprotocol/servers/tree/main/src/fetch").as_deref(),
            Some("modelcontextprotocol/servers")
        );
        assert_eq!(
            resolved("https://github.com/user/repo?tab=readme#install").as_deref(),
            Some("user/repo")
        );
    }

    #[test]
    fn test_git_transport_shapes() {
        assert_eq!(resolved("git@github.com:user/repo.git").as_deref(), Some("user/repo"));
        assert_eq!(resolved("git+https://github.com/user/repo.git").as_deref(), Some("user/repo"));
    }

    #[test]
    fn test_dotted_repository_names() {
        assert_eq!(resolved("https://github.com/vercel/next.js").as_deref(), Some("vercel/next.js"));
    }

    #[test]
    fn test_managed_user_owner_with_underscore() {
        assert_eq!(
            resolved("https://github.com/jdoe_acme/mcp-server").as_deref(),
            Some("jdoe_acme/mcp-server")
        );
    }

    #[test]
    fn test_non_github_links_are_absent() {
        assert_eq!(resolved("https://gitlab.com/user/repo"), None);
        assert_eq!(resolved("https://example.com/github.com/user/repo"), None);
        assert_eq!(resolved("https://github.company.com/user/repo"), None);
        assert_eq!(resolved("https://www.npmjs.com/package/foo"), None);
        assert_eq!(resolved(""), None);
        assert_eq!(resolved("not a url at all"), None);
    }

    #[test]
    fn test_incomplete_or_site_links_are_absent() {
        assert_eq!(resolved("https://github.com/user"), None);
        assert_eq!(resolved("https://github.com/"), None);
        assert_eq!(resolved("https://github.com/orgs/acme"), None);
        assert_eq!(resolved("https://github.com/topics/mcp"), None);
    }

    #[test]
    fn test_ssh_link_displays_as_owner_slash_repo() {
        let reference = resolve_reference("git@github.com:acme/tool.git").unwrap();
        assert_eq!(reference.to_string(), "acme/tool");
    }
}
