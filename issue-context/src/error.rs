//! Typed error for the issue-context crate.

use thiserror::Error;

pub type IssueContextResult<T> = Result<T, IssueContextError>;

#[derive(Debug, Error)]
pub enum IssueContextError {
    /// Transport errors when calling the issue tracker.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer for one issue.
    #[error("issue {key}: status {status}")]
    Status { key: String, status: u16 },

    /// Configuration problems (bad base URL, missing token).
    #[error("config error: {0}")]
    Config(String),
}
