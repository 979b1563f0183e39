//! Issue key detection (`ADMIN-123` style identifiers).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"\b[A-Z][A-Z0-9]+-\d+\b").expect("static issue key regex"))
}

/// Optional allow-list of project prefixes (`ADMIN`, `OPS`, ...).
///
/// An empty filter accepts every key.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    projects: HashSet<String>,
}

impl KeyFilter {
    pub fn new<I, S>(projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            projects: projects
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_uppercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parses a comma separated list such as `"ADMIN, OPS"`.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn accepts(&self, key: &str) -> bool {
        if self.projects.is_empty() {
            return true;
        }
        key.split_once('-')
            .is_some_and(|(project, _)| self.projects.contains(project))
    }
}

/// All distinct keys in `text`, in order of first appearance.
pub fn extract_issue_keys(text: &str, filter: &KeyFilter) -> Vec<String> {
    let mut seen = HashSet::new();
    key_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|k| filter.accepts(k))
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

/// The seed key for a PR: first match in the title, else in the description.
pub fn first_issue_key(title: &str, description: &str, filter: &KeyFilter) -> Option<String> {
    [title, description]
        .into_iter()
        .find_map(|text| extract_issue_keys(text, filter).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_keys_in_order_without_duplicates() {
        let keys = extract_issue_keys(
            "Fix nginx config (ADMIN-123), relates to OPS-7 and ADMIN-123 again",
            &KeyFilter::default(),
        );
        assert_eq!(keys, vec!["ADMIN-123".to_string(), "OPS-7".to_string()]);
    }

    #[test]
    fn ignores_lowercase_and_embedded_tokens() {
        let keys = extract_issue_keys("admin-1 XADMIN-2x A-3 B2-4", &KeyFilter::default());
        assert_eq!(keys, vec!["B2-4".to_string()]);
    }

    #[test]
    fn title_wins_over_description() {
        let f = KeyFilter::default();
        assert_eq!(
            first_issue_key("Fix (ADMIN-123)", "see OPS-1", &f).as_deref(),
            Some("ADMIN-123")
        );
        assert_eq!(
            first_issue_key("Fix nginx", "see OPS-1", &f).as_deref(),
            Some("OPS-1")
        );
        assert_eq!(first_issue_key("Fix nginx", "no key", &f), None);
    }

    #[test]
    fn filter_restricts_project_prefixes() {
        let f = KeyFilter::from_csv("admin, ");
        assert!(f.accepts("ADMIN-1"));
        assert!(!f.accepts("UTF-8"));
        assert_eq!(
            extract_issue_keys("UTF-8 encoding for ADMIN-5", &f),
            vec!["ADMIN-5".to_string()]
        );
    }
}
