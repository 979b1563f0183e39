//! Splitting of unified diffs into per-file blocks.
//!
//! Both classic git prefixes (`a/`, `b/`) and the `src://` / `dst://` prefixes
//! emitted by Bitbucket Server are understood. `/dev/null` marks the missing
//! side of an added or deleted file.

use crate::git_providers::types::FileDiff;

const FILE_HEADER: &str = "diff --git ";
const NULL_DEVICE: &str = "/dev/null";
const PATH_PREFIXES: [&str; 4] = ["a/", "b/", "src://", "dst://"];

/// Splits a raw unified diff into file blocks, in diff order.
///
/// Text before the first `diff --git` header is ignored; a diff without any
/// header yields an empty vector.
pub fn split_file_diffs(raw: &str) -> Vec<FileDiff> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for line in raw.lines() {
        if line.starts_with(FILE_HEADER) {
            blocks.push(vec![line]);
        } else if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }

    blocks.into_iter().map(|lines| parse_block(&lines)).collect()
}

fn parse_block(lines: &[&str]) -> FileDiff {
    let (mut old_path, mut new_path) = lines
        .first()
        .and_then(|l| l.strip_prefix(FILE_HEADER))
        .map(paths_from_git_header)
        .unwrap_or((None, None));

    let mut added_mode = false;
    let mut deleted_mode = false;

    // File headers only live before the first hunk; later `---` lines are content.
    for line in lines.iter().skip(1).take_while(|l| !l.starts_with("@@")) {
        if let Some(rest) = line.strip_prefix("--- ") {
            old_path = normalize_path(rest);
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            new_path = normalize_path(rest);
        } else if line.starts_with("new file mode") {
            added_mode = true;
        } else if line.starts_with("deleted file mode") {
            deleted_mode = true;
        }
    }

    if added_mode {
        old_path = None;
    }
    if deleted_mode {
        new_path = None;
    }

    FileDiff {
        is_new: old_path.is_none() && new_path.is_some(),
        is_deleted: new_path.is_none() && old_path.is_some(),
        old_path,
        new_path,
        raw_unidiff: lines.join("\n"),
    }
}

/// Extracts `(old, new)` from the remainder of a `diff --git` line.
fn paths_from_git_header(rest: &str) -> (Option<String>, Option<String>) {
    for (src, dst) in [("a/", " b/"), ("src://", " dst://")] {
        if let Some(r) = rest.strip_prefix(src) {
            if let Some((old, new)) = r.split_once(dst) {
                return (normalize_path(old), normalize_path(new));
            }
        }
    }

    let mut parts = rest.split_whitespace();
    let old = parts.next().and_then(normalize_path);
    let new = parts.next().and_then(normalize_path);
    (old, new)
}

/// Cleans one path token: drops a trailing tab + timestamp, surrounding quotes
/// and VCS prefixes. Returns `None` for the null device or an empty path.
pub fn normalize_path(raw: &str) -> Option<String> {
    let token = raw.split('\t').next().unwrap_or("").trim().trim_matches('"');

    if token.is_empty() || token == NULL_DEVICE {
        return None;
    }

    let stripped = PATH_PREFIXES
        .iter()
        .find_map(|p| token.strip_prefix(p))
        .unwrap_or(token);

    if stripped.is_empty() || stripped == NULL_DEVICE {
        None
    } else {
        Some(stripped.to_string())
    }
}
