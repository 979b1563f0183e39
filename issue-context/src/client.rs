//! Jira REST v2 client (single issue fetch).
//!
//! `GET {base}/rest/api/2/issue/{key}?fields=summary,description,issuelinks&expand=renderedFields`

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{IssueContextError, IssueContextResult};
use crate::keys::{KeyFilter, extract_issue_keys};

/// Placeholder used when the description is structured (non-text) data.
pub const NON_TEXT_DESCRIPTION: &str = "[non-text description omitted]";

/// Runtime configuration for the issue tracker.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Server base, e.g. "https://jira.example.com".
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
    /// Accepted project prefixes; empty accepts any key.
    pub key_filter: KeyFilter,
}

impl JiraConfig {
    /// Reads `JIRA_BASE_URL`, `JIRA_TOKEN`, `JIRA_PROJECT_KEYS` and
    /// `HTTP_TIMEOUT_SECS`.
    ///
    /// Returns `Ok(None)` when `JIRA_BASE_URL` is unset, which disables
    /// issue context for the whole run.
    pub fn from_env() -> IssueContextResult<Option<Self>> {
        let Some(base_url) = non_empty_env("JIRA_BASE_URL") else {
            return Ok(None);
        };
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(IssueContextError::Config(format!(
                "JIRA_BASE_URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        let token = non_empty_env("JIRA_TOKEN")
            .ok_or_else(|| IssueContextError::Config("JIRA_TOKEN is required".into()))?;
        let timeout_secs = non_empty_env("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let key_filter = non_empty_env("JIRA_PROJECT_KEYS")
            .map(|csv| KeyFilter::from_csv(&csv))
            .unwrap_or_default();

        Ok(Some(Self {
            base_url,
            token,
            timeout_secs,
            key_filter,
        }))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Summary of one issue as used in review prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub key: String,
    pub summary: String,
    pub description: String,
}

/// An issue plus the keys it points at.
#[derive(Debug, Clone)]
pub struct FetchedIssue {
    pub record: IssueRecord,
    /// Keys mentioned in summary/description text.
    pub mentioned: Vec<String>,
    /// Keys from structured issue links (inward and outward).
    pub linked: Vec<String>,
}

impl FetchedIssue {
    /// Mentions followed by links, without the issue's own key.
    pub fn related_keys(&self) -> impl Iterator<Item = &str> {
        self.mentioned
            .iter()
            .chain(self.linked.iter())
            .map(String::as_str)
            .filter(move |k| *k != self.record.key)
    }
}

/// Thin Jira client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    key_filter: KeyFilter,
}

impl JiraClient {
    pub fn from_config(cfg: &JiraConfig) -> IssueContextResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("pr-review-bot/0.1")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            key_filter: cfg.key_filter.clone(),
        })
    }

    pub fn key_filter(&self) -> &KeyFilter {
        &self.key_filter
    }

    /// Fetches one issue and extracts its text and related keys.
    pub async fn get_issue(&self, key: &str) -> IssueContextResult<FetchedIssue> {
        let url = format!("{}/rest/api/2/issue/{}", self.base_url, urlencoding::encode(key));
        debug!("Jira get_issue: {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[
                ("fields", "summary,description,issuelinks"),
                ("expand", "renderedFields"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IssueContextError::Status {
                key: key.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let issue: JiraIssue = resp.json().await?;
        Ok(issue.into_fetched(key, &self.key_filter))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraIssue {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    fields: JiraFields,
    #[serde(default)]
    rendered_fields: Option<JiraRendered>,
}

#[derive(Debug, Default, Deserialize)]
struct JiraFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    issuelinks: Vec<JiraLink>,
}

#[derive(Debug, Deserialize)]
struct JiraRendered {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraLink {
    #[serde(default)]
    inward_issue: Option<JiraLinkedIssue>,
    #[serde(default)]
    outward_issue: Option<JiraLinkedIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraLinkedIssue {
    key: String,
}

impl JiraIssue {
    fn into_fetched(self, requested: &str, filter: &KeyFilter) -> FetchedIssue {
        let key = self.key.unwrap_or_else(|| requested.to_string());
        let summary = self.fields.summary.unwrap_or_default();
        let rendered = self.rendered_fields.and_then(|r| r.description);
        let description = select_description(rendered.as_deref(), &self.fields.description);

        let mentioned = extract_issue_keys(&format!("{summary}\n{description}"), filter);
        let linked = self
            .fields
            .issuelinks
            .into_iter()
            .flat_map(|l| [l.inward_issue, l.outward_issue])
            .flatten()
            .map(|i| i.key)
            .filter(|k| filter.accepts(k))
            .collect();

        FetchedIssue {
            record: IssueRecord {
                key,
                summary,
                description,
            },
            mentioned,
            linked,
        }
    }
}

/// Picks the description to show: rendered text first, then the raw string,
/// then a placeholder for structured payloads.
pub fn select_description(rendered: Option<&str>, raw: &Value) -> String {
    if let Some(html) = rendered {
        let text = html_to_text(html);
        if !text.is_empty() {
            return text;
        }
    }
    match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        _ => NON_TEXT_DESCRIPTION.to_string(),
    }
}

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static BREAK_RE: OnceLock<Regex> = OnceLock::new();
static BLANK_RE: OnceLock<Regex> = OnceLock::new();

/// Reduces rendered HTML to plain text.
pub fn html_to_text(html: &str) -> String {
    let breaks = BREAK_RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</h\d>|</tr>").expect("static break regex")
    });
    let tags = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag regex"));
    let blanks = BLANK_RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static blank regex"));

    let text = breaks.replace_all(html, "\n");
    let text = tags.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    blanks.replace_all(text.trim(), "\n\n").into_owned()
}
