//! Host-agnostic data model for pull requests, repository listings and diffs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open pull request as returned by the host's list endpoint.
///
/// `target_ref` is the fully qualified destination ref (e.g. `refs/heads/main`)
/// and may be absent in abbreviated list payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub target_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Kind of entry returned by the browse API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One child of a browsed directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    /// Repository-relative path (directory prefix included).
    pub path: String,
    pub extension: Option<String>,
    pub kind: EntryKind,
}

impl DirEntry {
    /// `true` for regular files with a `yml` or `yaml` extension.
    pub fn is_yaml_file(&self) -> bool {
        self.kind == EntryKind::File
            && matches!(
                self.extension.as_deref().map(str::to_ascii_lowercase).as_deref(),
                Some("yml") | Some("yaml")
            )
    }
}

/// One page of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowsePage {
    pub entries: Vec<DirEntry>,
    pub is_last_page: bool,
    /// Offset of the next page; `None` on the last page.
    pub next_page_start: Option<u32>,
}

/// File-level section of a unified diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDiff {
    /// Path before the change; `None` for added files.
    pub old_path: Option<String>,
    /// Path after the change; `None` for deleted files.
    pub new_path: Option<String>,
    pub is_new: bool,
    pub is_deleted: bool,
    /// Raw text of this block, file header included.
    pub raw_unidiff: String,
}

impl FileDiff {
    /// Path shown to reviewers: new path, then old path, then a placeholder.
    pub fn display_path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("(unknown)")
    }
}
