//! Repository context assembler.
//!
//! Turns the raw PR diff into per-file blocks (original content at the target
//! ref + diff text) and collects YAML files of every Ansible role the PR
//! touches. Fetch failures never abort the PR: originals get a placeholder,
//! role directories and files are skipped.

pub mod roles;

use git_context_engine::{BitbucketClient, ContentCache, FileDiff, split_file_diffs};
use tracing::{debug, warn};

use crate::config::ReviewLimits;
use crate::truncate::head_tail;

pub use roles::{ROLE_SUBDIRS, RoleContext, RoleFile, role_root, touched_roles};

/// Original text used for files that did not exist at the target ref.
pub const NEW_FILE_PLACEHOLDER: &str = "[new file: no original content]";

/// One file touched by the PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeBlock {
    pub display_path: String,
    /// Path at the target ref, `None` for added files.
    pub original_path: Option<String>,
    /// Content before the change (truncated) or a placeholder.
    pub original: String,
    /// Diff block text (truncated).
    pub diff: String,
    pub is_new: bool,
    pub is_deleted: bool,
}

/// Everything the prompt needs from the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoContext {
    /// In diff order.
    pub files: Vec<FileChangeBlock>,
    /// Sorted by role root.
    pub roles: Vec<RoleContext>,
}

/// Builds the repository context for one PR.
pub async fn assemble_repo_context(
    client: &BitbucketClient,
    cache: &mut ContentCache,
    raw_diff: &str,
    target_ref: &str,
    limits: &ReviewLimits,
) -> RepoContext {
    let diffs = split_file_diffs(raw_diff);
    debug!(files = diffs.len(), "context: diff split");

    let mut files = Vec::with_capacity(diffs.len());
    for diff in &diffs {
        files.push(file_block(client, cache, diff, target_ref, limits).await);
    }

    let roots = touched_roles(
        diffs
            .iter()
            .flat_map(|d| [d.old_path.as_deref(), d.new_path.as_deref()])
            .flatten(),
    );
    if roots.len() > limits.max_roles {
        debug!(touched = roots.len(), max = limits.max_roles, "context: role cap reached");
    }

    let mut roles = Vec::new();
    for root in roots.iter().take(limits.max_roles) {
        roles.push(roles::collect_role_context(client, cache, root, target_ref, limits).await);
    }

    debug!(
        files = files.len(),
        roles = roles.len(),
        cache_entries = cache.len(),
        cache_hits = cache.hits(),
        "context: assembled"
    );
    RepoContext { files, roles }
}

async fn file_block(
    client: &BitbucketClient,
    cache: &mut ContentCache,
    diff: &FileDiff,
    target_ref: &str,
    limits: &ReviewLimits,
) -> FileChangeBlock {
    let original = match diff.old_path.as_deref() {
        Some(path) => match client.get_file_cached(cache, path, target_ref).await {
            Ok(text) => head_tail(&text, limits.file_head_chars, limits.file_tail_chars).into_owned(),
            Err(e) => {
                warn!(path, "context: original load failed: {e}");
                match e.status_code() {
                    Some(status) => format!("[failed to load original content: HTTP {status}]"),
                    None => format!("[failed to load original content: {e}]"),
                }
            }
        },
        None => NEW_FILE_PLACEHOLDER.to_string(),
    };

    FileChangeBlock {
        display_path: diff.display_path().to_string(),
        original_path: diff.old_path.clone(),
        original,
        diff: head_tail(&diff.raw_unidiff, limits.diff_head_chars, limits.diff_tail_chars)
            .into_owned(),
        is_new: diff.is_new,
        is_deleted: diff.is_deleted,
    }
}
