//! Prompt builder: one bounded text payload per PR.
//!
//! Block order is fixed: environment policy, issue context (optional),
//! review instructions, one section per changed file, role context (optional).

use issue_context::IssueRecord;

use crate::config::ReviewLimits;
use crate::context::RepoContext;
use crate::publish::NO_ISSUES_SENTINEL;
use crate::truncate::{hard_limit, within_budget};

pub const PROMPT_TRUNCATION_MARKER: &str = "\n\n[... prompt truncated: hard limit reached ...]";

const ENVIRONMENT_POLICY: &str = "\
You are reviewing a pull request to an Ansible repository.

=== ENVIRONMENT ===
- Playbooks and roles target Linux hosts managed by Ansible; roles live under roles/<name>/.
- Role defaults belong in defaults/main.yml, higher-precedence values in vars/, \
handlers in handlers/, dependencies and metadata in meta/.
- Tasks must be idempotent: prefer dedicated modules over command/shell, and guard \
command/shell with creates/removes or changed_when.
- Every task has a name; variables are referenced as \"{{ var }}\" and prefixed with the role name.
- Secrets are never committed in plain text; they come from vault or external lookups.
- Privilege escalation (become) is requested only where it is needed.
- Services are restarted through handlers triggered by notify, not by unconditional tasks.
";

fn review_instructions() -> String {
    format!(
        "\
=== REVIEW INSTRUCTIONS ===
Review the changes below and identify any of these issues: Broken Code, Syntax Errors, \
Duplicate Code, Null Variables, Unused Code, Mutable Existence, Code Optimization, Confusing Code, \
and violations of the environment rules above.
Judge the diff against the original file content and the role context. Use the issue context \
to check that the change does what the linked issues ask for.
If there are no issues, answer exactly: {NO_ISSUES_SENTINEL}
Otherwise answer with a bulleted list, one bullet per issue, each with:
- Title: a short name for the issue
- Description: what is wrong and how to fix it, clear, simple and concise
- Location: file path and the affected line or task name
List only detected issues.
"
    )
}

/// Concatenates every block and applies the hard prompt cap.
pub fn build_prompt(issues: &[IssueRecord], ctx: &RepoContext, limits: &ReviewLimits) -> String {
    let mut s = String::new();
    s.push_str(ENVIRONMENT_POLICY);

    if !issues.is_empty() {
        s.push_str("\n=== ISSUE CONTEXT ===\n");
        for issue in issues {
            s.push_str(&format!("\n[{}] {}\n", issue.key, issue.summary));
            if !issue.description.is_empty() {
                s.push_str(&within_budget(&issue.description, limits.issue_description_max_chars));
                s.push('\n');
            }
        }
    }

    s.push('\n');
    s.push_str(&review_instructions());

    for file in &ctx.files {
        s.push_str(&format!("\n=== FILE: {} ===\n", file.display_path));
        if file.is_new {
            s.push_str("(file is added by this pull request)\n");
        } else if file.is_deleted {
            s.push_str("(file is deleted by this pull request)\n");
        } else if let Some(old) = file
            .original_path
            .as_deref()
            .filter(|old| *old != file.display_path)
        {
            s.push_str(&format!("(renamed from {old})\n"));
        }
        s.push_str("--- ORIGINAL CONTENT ---\n");
        s.push_str(&file.original);
        s.push_str("\n--- DIFF ---\n");
        s.push_str(&file.diff);
        s.push('\n');
    }

    if !ctx.roles.is_empty() {
        s.push_str("\n=== ROLE CONTEXT ===\n");
        for role in &ctx.roles {
            s.push_str(&format!("\n## Role {}\n", role.root));
            if role.files.is_empty() {
                s.push_str("(no defaults/vars/handlers/meta files found)\n");
            }
            for file in &role.files {
                s.push_str(&format!("--- {} ---\n", file.path));
                s.push_str(&file.content);
                s.push('\n');
            }
        }
    }

    hard_limit(&s, limits.max_prompt_chars, PROMPT_TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FileChangeBlock, RoleContext, RoleFile};

    fn issue(key: &str) -> IssueRecord {
        IssueRecord {
            key: key.into(),
            summary: format!("summary {key}"),
            description: "details".into(),
        }
    }

    fn file(path: &str) -> FileChangeBlock {
        FileChangeBlock {
            display_path: path.into(),
            original_path: Some(path.into()),
            original: "a: 1".into(),
            diff: "-a: 1\n+a: 2".into(),
            is_new: false,
            is_deleted: false,
        }
    }

    #[test]
    fn zero_files_means_no_file_sections() {
        let p = build_prompt(&[], &RepoContext::default(), &ReviewLimits::default());
        assert!(p.starts_with(ENVIRONMENT_POLICY));
        assert!(p.contains("=== REVIEW INSTRUCTIONS ==="));
        assert!(p.contains(NO_ISSUES_SENTINEL));
        assert!(!p.contains("=== FILE"));
        assert!(!p.contains("=== ISSUE CONTEXT ==="));
        assert!(!p.contains("=== ROLE CONTEXT ==="));
    }

    #[test]
    fn blocks_appear_in_fixed_order() {
        let ctx = RepoContext {
            files: vec![file("roles/nginx/tasks/main.yml"), file("playbook.yml")],
            roles: vec![RoleContext {
                root: "roles/nginx".into(),
                files: vec![RoleFile {
                    path: "roles/nginx/defaults/main.yml".into(),
                    content: "nginx_port: 80".into(),
                }],
            }],
        };
        let p = build_prompt(&[issue("ADMIN-123")], &ctx, &ReviewLimits::default());

        let order = [
            "=== ENVIRONMENT ===",
            "=== ISSUE CONTEXT ===",
            "[ADMIN-123] summary ADMIN-123",
            "=== REVIEW INSTRUCTIONS ===",
            "=== FILE: roles/nginx/tasks/main.yml ===",
            "=== FILE: playbook.yml ===",
            "=== ROLE CONTEXT ===",
            "--- roles/nginx/defaults/main.yml ---",
        ];
        let positions: Vec<usize> = order.iter().map(|m| p.find(m).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn file_status_is_marked() {
        let mut added = file("new.yml");
        added.original_path = None;
        added.is_new = true;
        let mut renamed = file("site.yml");
        renamed.original_path = Some("main.yml".into());
        let ctx = RepoContext {
            files: vec![added, renamed, file("plain.yml")],
            roles: Vec::new(),
        };
        let p = build_prompt(&[], &ctx, &ReviewLimits::default());

        assert!(p.contains("=== FILE: new.yml ===\n(file is added by this pull request)\n"));
        assert!(p.contains("=== FILE: site.yml ===\n(renamed from main.yml)\n"));
        assert!(p.contains("=== FILE: plain.yml ===\n--- ORIGINAL CONTENT ---\n"));
    }

    #[test]
    fn long_issue_descriptions_are_shortened() {
        let mut long = issue("OPS-1");
        long.description = "d".repeat(10_000);
        let limits = ReviewLimits {
            issue_description_max_chars: 100,
            ..ReviewLimits::default()
        };
        let p = build_prompt(&[long], &RepoContext::default(), &limits);
        assert!(p.contains("[... truncated ...]"));
        assert!(!p.contains(&"d".repeat(101)));
    }

    #[test]
    fn hard_cap_is_never_exceeded() {
        let mut big = file("big.yml");
        big.diff = "x".repeat(50_000);
        let limits = ReviewLimits {
            max_prompt_chars: 5_000,
            ..ReviewLimits::default()
        };
        let ctx = RepoContext {
            files: vec![big],
            roles: Vec::new(),
        };
        let p = build_prompt(&[], &ctx, &limits);
        assert_eq!(p.chars().count(), 5_000);
        assert!(p.ends_with("[... prompt truncated: hard limit reached ...]"));
    }
}
