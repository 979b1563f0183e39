//! Ansible role context: YAML files from the fixed role subdirectories.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use git_context_engine::{BitbucketClient, ContentCache};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ReviewLimits;
use crate::truncate::head_tail;

/// Role subdirectories whose YAML files are loaded, in this order.
pub const ROLE_SUBDIRS: [&str; 4] = ["defaults", "vars", "handlers", "meta"];

/// A YAML file loaded from a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleFile {
    pub path: String,
    pub content: String,
}

/// YAML files of one touched role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleContext {
    /// Repository path of the role, e.g. `roles/nginx` or `infra/roles/nginx`.
    pub root: String,
    pub files: Vec<RoleFile>,
}

static ROLE_RE: OnceLock<Regex> = OnceLock::new();

/// Role root of a path under `roles/<name>/`, keeping any leading directories.
///
/// `roles/nginx/tasks/main.yml` → `roles/nginx`,
/// `infra/roles/db/vars/x.yml` → `infra/roles/db`.
pub fn role_root(path: &str) -> Option<String> {
    let re = ROLE_RE.get_or_init(|| {
        Regex::new(r"^((?:.*?/)?)roles/([^/]+)/").expect("static role path regex")
    });
    let caps = re.captures(path)?;
    Some(format!("{}roles/{}", &caps[1], &caps[2]))
}

/// Sorted, deduplicated role roots of the given paths.
pub fn touched_roles<'a>(paths: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    paths.into_iter().filter_map(role_root).collect()
}

/// Loads up to `max_role_files` YAML files from the role's subdirectories.
///
/// A directory that cannot be browsed is skipped; so is a file that cannot be
/// fetched.
pub(crate) async fn collect_role_context(
    client: &BitbucketClient,
    cache: &mut ContentCache,
    root: &str,
    target_ref: &str,
    limits: &ReviewLimits,
) -> RoleContext {
    let mut files = Vec::new();

    'dirs: for sub in ROLE_SUBDIRS {
        let dir = format!("{root}/{sub}");
        let mut start = 0;

        loop {
            if files.len() >= limits.max_role_files {
                debug!(role = root, "context: role file cap reached");
                break 'dirs;
            }

            let page = match client
                .browse_directory(&dir, target_ref, start, limits.browse_page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    debug!(dir = %dir, "context: browse skipped: {e}");
                    continue 'dirs;
                }
            };

            for entry in page.entries.iter().filter(|e| e.is_yaml_file()) {
                if files.len() >= limits.max_role_files {
                    break;
                }
                match client.get_file_cached(cache, &entry.path, target_ref).await {
                    Ok(text) => files.push(RoleFile {
                        path: entry.path.clone(),
                        content: head_tail(
                            &text,
                            limits.role_file_head_chars,
                            limits.role_file_tail_chars,
                        )
                        .into_owned(),
                    }),
                    Err(e) => warn!(path = %entry.path, "context: role file skipped: {e}"),
                }
            }

            match page.next_page_start {
                Some(next) if !page.is_last_page && next > start => start = next,
                _ => break,
            }
        }
    }

    debug!(role = root, files = files.len(), "context: role collected");
    RoleContext {
        root: root.to_string(),
        files,
    }
}
