use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = "repolens";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 100;

/// Repository metadata as returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub full_name: String,
    #[serde(rename = "stargazers_count")]
    pub stars: u64,
    #[serde(rename = "forks_count")]
    pub forks: u64,
    #[serde(rename = "open_issues_count")]
    pub open_issues: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub pushed_at: OffsetDateTime,
    #[serde(rename = "watchers_count")]
    pub watchers: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub private: bool,
    pub default_branch: String,
    pub html_url: String,
    pub clone_url: String,
}

impl Repo {
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(rename = "contributions")]
    pub commits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == TreeEntryKind::Tree
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "GitHub API returned status {status} for {url} (tip: set GITHUB_TOKEN for higher rate limits)"
    )]
    Status { status: u16, url: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Fetch operations the analysis pipelines consume. `GithubClient` is the
/// production implementation; tests script this trait directly.
pub trait RepoFetcher: Send + Sync {
    fn repo(&self, owner: &str, name: &str) -> Result<Repo, FetchError>;
    fn commits(&self, owner: &str, name: &str, days: u32) -> Result<Vec<Commit>, FetchError>;
    fn contributors(&self, owner: &str, name: &str) -> Result<Vec<Contributor>, FetchError>;
    fn languages(&self, owner: &str, name: &str) -> Result<BTreeMap<String, u64>, FetchError>;
    fn file_tree(&self, owner: &str, name: &str, branch: &str)
    -> Result<Vec<TreeEntry>, FetchError>;
}

pub struct GithubClient {
    agent: ureq::Agent,
    token: Option<String>,
}

impl GithubClient {
    /// Builds a client, picking up `GITHUB_TOKEN` from the environment when
    /// set. Unauthenticated requests work but hit much lower rate limits.
    pub fn from_env() -> Self {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::new(token)
    }

    pub fn new(token: Option<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .new_agent();
        Self { agent, token }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        match request.call() {
            Ok(mut response) => {
                response
                    .body_mut()
                    .read_json::<T>()
                    .map_err(|error| FetchError::Decode {
                        url: url.to_string(),
                        message: error.to_string(),
                    })
            }
            Err(ureq::Error::StatusCode(status)) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            Err(error) => Err(FetchError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }),
        }
    }
}

fn since_parameter(days: u32) -> Result<String, FetchError> {
    let since = OffsetDateTime::now_utc() - time::Duration::days(i64::from(days));
    since.format(&Rfc3339).map_err(|error| FetchError::Transport {
        url: String::new(),
        message: format!("failed to format commit window timestamp: {error}"),
    })
}

impl RepoFetcher for GithubClient {
    fn repo(&self, owner: &str, name: &str) -> Result<Repo, FetchError> {
        self.get(&format!("{API_ROOT}/repos/{owner}/{name}"))
    }

    fn commits(&self, owner: &str, name: &str, days: u32) -> Result<Vec<Commit>, FetchError> {
        let since = since_parameter(days)?;
        let url = format!(
            "{API_ROOT}/repos/{owner}/{name}/commits?since={since}&per_page={PAGE_SIZE}"
        );
        tracing::debug!(%url, "fetching commit history");
        self.get(&url)
    }

    fn contributors(&self, owner: &str, name: &str) -> Result<Vec<Contributor>, FetchError> {
        self.get(&format!(
            "{API_ROOT}/repos/{owner}/{name}/contributors?per_page={PAGE_SIZE}"
        ))
    }

    fn languages(&self, owner: &str, name: &str) -> Result<BTreeMap<String, u64>, FetchError> {
        self.get(&format!("{API_ROOT}/repos/{owner}/{name}/languages"))
    }

    fn file_tree(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, FetchError> {
        let url = format!("{API_ROOT}/repos/{owner}/{name}/git/trees/{branch}?recursive=1");
        let response: TreeResponse = self.get(&url)?;
        Ok(response.tree)
    }
}
