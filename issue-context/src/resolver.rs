//! Breadth-first traversal of the issue graph reachable from a PR.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::client::{IssueRecord, JiraClient};
use crate::keys::first_issue_key;

/// Collects every issue reachable from the PR's seed key.
///
/// The seed is the first key found in `title`, else in `description`. Related
/// keys (text mentions and issue links) are followed until the queue drains.
/// A failed fetch abandons that branch only. Records come back in discovery
/// order, each key at most once.
pub async fn resolve_issue_context(
    client: &JiraClient,
    title: &str,
    description: &str,
) -> Vec<IssueRecord> {
    let Some(seed) = first_issue_key(title, description, client.key_filter()) else {
        debug!("issues: no issue key in PR title or description");
        return Vec::new();
    };

    let mut queue = VecDeque::from([seed.clone()]);
    let mut visited = HashSet::from([seed]);
    let mut records = Vec::new();

    while let Some(key) = queue.pop_front() {
        let issue = match client.get_issue(&key).await {
            Ok(issue) => issue,
            Err(e) => {
                warn!(issue = %key, "issues: fetch failed: {e}");
                continue;
            }
        };

        for related in issue.related_keys() {
            if visited.insert(related.to_string()) {
                queue.push_back(related.to_string());
            }
        }
        records.push(issue.record);
    }

    debug!(count = records.len(), "issues: traversal finished");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JiraConfig;
    use crate::keys::KeyFilter;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::from_config(&JiraConfig {
            base_url: server.uri(),
            token: "t".into(),
            timeout_secs: 5,
            key_filter: KeyFilter::default(),
        })
        .unwrap()
    }

    async fn mount_issue(server: &MockServer, key: &str, description: &str, links: &[&str]) {
        let links: Vec<_> = links
            .iter()
            .map(|k| json!({"outwardIssue": {"key": k}}))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/rest/api/2/issue/{key}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": key,
                "fields": {
                    "summary": format!("summary of {key}"),
                    "description": description,
                    "issuelinks": links
                }
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn cyclic_links_are_visited_once_in_bfs_order() {
        let server = MockServer::start().await;
        mount_issue(&server, "ADMIN-1", "see ADMIN-3", &["ADMIN-2"]).await;
        mount_issue(&server, "ADMIN-2", "", &["ADMIN-1"]).await;
        mount_issue(&server, "ADMIN-3", "back to ADMIN-1", &[]).await;

        let records =
            resolve_issue_context(&client_for(&server), "Fix nginx (ADMIN-1)", "").await;

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["ADMIN-1", "ADMIN-3", "ADMIN-2"]);
        assert_eq!(records[0].summary, "summary of ADMIN-1");
    }

    #[tokio::test]
    async fn failed_branch_does_not_stop_traversal() {
        let server = MockServer::start().await;
        mount_issue(&server, "OPS-1", "", &["OPS-404", "OPS-2"]).await;
        mount_issue(&server, "OPS-2", "", &[]).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/OPS-404"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let records = resolve_issue_context(&client_for(&server), "no key", "Refs OPS-1").await;

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["OPS-1", "OPS-2"]);
    }

    #[tokio::test]
    async fn no_key_means_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let records = resolve_issue_context(&client_for(&server), "Fix nginx", "").await;
        assert!(records.is_empty());
    }
}
