//! Issue-tracker context for pull request reviews.
//!
//! Starting from the first issue key found in a PR title/description, the
//! resolver walks Jira issues breadth-first along textual mentions and issue
//! links, fetching every key at most once.

pub mod client;
pub mod error;
pub mod keys;
pub mod resolver;

pub use client::{FetchedIssue, IssueRecord, JiraClient, JiraConfig};
pub use error::{IssueContextError, IssueContextResult};
pub use keys::{KeyFilter, extract_issue_keys, first_issue_key};
pub use resolver::resolve_issue_context;
