//! Bitbucket Server / Data Center provider (REST `api/latest`).
//!
//! Endpoints used:
//!   * GET  /rest/api/latest/projects/{project}/repos/{repo}/pull-requests?state=OPEN&limit=N
//!   * GET  /rest/api/latest/projects/{project}/repos/{repo}/pull-requests/{id}
//!   * GET  /rest/api/latest/projects/{project}/repos/{repo}/pull-requests/{id}.diff?contextLines=N
//!   * GET  /rest/api/latest/projects/{project}/repos/{repo}/raw/{path}?at={ref}
//!   * GET  /rest/api/latest/projects/{project}/repos/{repo}/browse/{path}?at={ref}&start=S&limit=L
//!   * POST /rest/api/latest/projects/{project}/repos/{repo}/pull-requests/{id}/comments

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::ContentCache;
use crate::errors::{GitContextEngineError, GitContextEngineProviderError, GitContextEngineResult};
use crate::git_providers::types::*;

/// Bitbucket Server HTTP client wrapper bound to one repository.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: Client,
    /// "https://bitbucket.example.com/rest/api/latest/projects/{p}/repos/{r}"
    repo_api: String,
    token: String,
}

impl BitbucketClient {
    /// Constructs a client with a shared HTTP instance and bearer token.
    pub fn new(http: Client, base_api: &str, project: &str, repo: &str, token: String) -> Self {
        let repo_api = format!(
            "{}/rest/api/latest/projects/{}/repos/{}",
            base_api.trim_end_matches('/'),
            urlencoding::encode(project),
            urlencoding::encode(repo)
        );
        debug!("Creating BitbucketClient with repo_api={}", repo_api);
        Self {
            http,
            repo_api,
            token,
        }
    }

    /// Lists open pull requests (first page, at most `limit` entries).
    ///
    /// Entries with an unusable `createdDate` are dropped with a warning.
    pub async fn list_open_pull_requests(
        &self,
        limit: u32,
    ) -> GitContextEngineResult<Vec<PullRequestSummary>> {
        let url = format!("{}/pull-requests", self.repo_api);
        debug!("Bitbucket list_open_pull_requests: {} limit={}", url, limit);

        let page: BbsPage<BbsPullRequest> = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json;charset=UTF-8")
            .query(&[("state", "OPEN".to_string()), ("limit", limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let prs = page
            .values
            .into_iter()
            .filter_map(|pr| match pr.into_summary() {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!(%err, "skipping pull request with invalid payload");
                    None
                }
            })
            .collect();

        Ok(prs)
    }

    /// Fetches a single pull request (used to recover a missing target ref).
    pub async fn get_pull_request(&self, id: u64) -> GitContextEngineResult<PullRequestSummary> {
        let url = format!("{}/pull-requests/{}", self.repo_api, id);
        debug!("Bitbucket get_pull_request: {}", url);

        let pr: BbsPullRequest = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json;charset=UTF-8")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        pr.into_summary()
    }

    /// Fetches the unified diff of a pull request as raw text.
    pub async fn get_diff(&self, id: u64, context_lines: u32) -> GitContextEngineResult<String> {
        let url = format!("{}/pull-requests/{}.diff", self.repo_api, id);
        debug!("Bitbucket get_diff: {} contextLines={}", url, context_lines);

        let text = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("contextLines", context_lines)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }

    /// Fetches raw file text at a specific ref.
    ///
    /// Any non-2xx status surfaces as a provider error carrying that status.
    pub async fn get_file_raw(
        &self,
        repo_relative_path: &str,
        git_ref: &str,
    ) -> GitContextEngineResult<String> {
        let url = format!("{}/raw/{}", self.repo_api, encode_path(repo_relative_path));
        debug!("Bitbucket get_file_raw: {} at={}", url, git_ref);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("at", git_ref)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), path = repo_relative_path, "raw fetch failed");
            return Err(GitContextEngineProviderError::from_status(status.as_u16()).into());
        }

        let bytes = resp.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Same as [`Self::get_file_raw`], answered from `cache` when possible.
    pub async fn get_file_cached(
        &self,
        cache: &mut ContentCache,
        repo_relative_path: &str,
        git_ref: &str,
    ) -> GitContextEngineResult<String> {
        if let Some(text) = cache.get(repo_relative_path, git_ref) {
            debug!(path = repo_relative_path, "content cache hit");
            return Ok(text.to_string());
        }

        let text = self.get_file_raw(repo_relative_path, git_ref).await?;
        cache.insert(repo_relative_path, git_ref, text.clone());
        Ok(text)
    }

    /// Lists one page of a directory at a ref.
    pub async fn browse_directory(
        &self,
        dir: &str,
        git_ref: &str,
        start: u32,
        limit: u32,
    ) -> GitContextEngineResult<BrowsePage> {
        let dir = dir.trim_matches('/');
        let url = format!("{}/browse/{}", self.repo_api, encode_path(dir));
        debug!("Bitbucket browse_directory: {} at={} start={}", url, git_ref, start);

        let resp: BbsBrowse = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json;charset=UTF-8")
            .query(&[
                ("at", git_ref.to_string()),
                ("start", start.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(children) = resp.children else {
            return Err(GitContextEngineError::Validation(format!(
                "'{dir}' is not a directory at {git_ref}"
            )));
        };

        let entries = children
            .values
            .into_iter()
            .map(|child| child.into_entry(dir))
            .collect();

        Ok(BrowsePage {
            entries,
            is_last_page: children.is_last_page,
            next_page_start: children.next_page_start,
        })
    }

    /// Posts a general (non-inline) comment to a pull request.
    pub async fn post_comment(&self, id: u64, text: &str) -> GitContextEngineResult<()> {
        let url = format!("{}/pull-requests/{}/comments", self.repo_api, id);
        debug!("Bitbucket post_comment: url={} chars={}", url, text.len());

        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json;charset=UTF-8")
            .json(&BbsCommentCreate { text })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Percent-encodes each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn default_true() -> bool {
    true
}

/// Generic paged response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BbsPage<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default = "default_true")]
    is_last_page: bool,
    #[serde(default)]
    next_page_start: Option<u32>,
}

/// Pull request payload (subset).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BbsPullRequest {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_date: Option<i64>,
    #[serde(default)]
    to_ref: Option<BbsRef>,
}

impl BbsPullRequest {
    fn into_summary(self) -> GitContextEngineResult<PullRequestSummary> {
        let created_at: DateTime<Utc> = self
            .created_date
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| {
                GitContextEngineError::Validation(format!(
                    "pull request {} has missing or invalid createdDate {:?}",
                    self.id, self.created_date
                ))
            })?;

        Ok(PullRequestSummary {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            target_ref: self
                .to_ref
                .and_then(|r| r.id)
                .filter(|id| !id.trim().is_empty()),
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BbsRef {
    #[serde(default)]
    id: Option<String>,
}

/// Browse response: `children` is present for directories only.
#[derive(Debug, Deserialize)]
struct BbsBrowse {
    #[serde(default)]
    children: Option<BbsPage<BbsChild>>,
}

#[derive(Debug, Deserialize)]
struct BbsChild {
    path: BbsPath,
    #[serde(rename = "type", default)]
    kind: String,
}

impl BbsChild {
    fn into_entry(self, dir: &str) -> DirEntry {
        let rel = if self.path.text.is_empty() {
            self.path.components.join("/")
        } else {
            self.path.text
        };
        let name = self
            .path
            .name
            .unwrap_or_else(|| rel.rsplit('/').next().unwrap_or_default().to_string());
        let extension = self.path.extension.or_else(|| {
            name.rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
                .filter(|ext| !ext.is_empty())
        });
        let kind = match self.kind.as_str() {
            "FILE" => EntryKind::File,
            "DIRECTORY" => EntryKind::Directory,
            _ => EntryKind::Other,
        };
        let path = if dir.is_empty() {
            rel
        } else {
            format!("{dir}/{rel}")
        };

        DirEntry {
            path,
            extension,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BbsPath {
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    extension: Option<String>,
    #[serde(rename = "toString", default)]
    text: String,
}

/// Comment creation payload.
#[derive(Debug, Serialize)]
struct BbsCommentCreate<'a> {
    text: &'a str,
}
