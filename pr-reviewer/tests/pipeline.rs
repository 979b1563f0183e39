//! End-to-end batch runs against mocked Bitbucket, Jira and Ollama servers.

use ai_llm_service::{LlmModelConfig, LlmProvider};
use chrono::{TimeDelta, Utc};
use git_context_engine::ProviderConfig;
use issue_context::{JiraConfig, KeyFilter};
use pr_reviewer::publish::DISCLOSURE_NOTICE;
use pr_reviewer::{PrOutcome, PromptDumpConfig, ReviewLimits, ReviewerConfig, Step, run_batch};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{
    body_json, body_partial_json, body_string_contains, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/rest/api/latest/projects/OPS/repos/ansible";
const REF: &str = "refs/heads/main";

const DIFF: &str = "\
diff --git a/roles/nginx/tasks/main.yml b/roles/nginx/tasks/main.yml
--- a/roles/nginx/tasks/main.yml
+++ b/roles/nginx/tasks/main.yml
@@ -1,2 +1,2 @@
 - name: install nginx
-  apt: name=nginx state=present
+  apt: name=nginx state=latest
diff --git a/playbook.yml b/playbook.yml
--- a/playbook.yml
+++ b/playbook.yml
@@ -1 +1,2 @@
 - hosts: web
+  become: true
";

struct Servers {
    bitbucket: MockServer,
    jira: MockServer,
    ollama: MockServer,
}

impl Servers {
    async fn start() -> Self {
        Self {
            bitbucket: MockServer::start().await,
            jira: MockServer::start().await,
            ollama: MockServer::start().await,
        }
    }

    fn config(&self, with_jira: bool, dump_dir: Option<&std::path::Path>) -> ReviewerConfig {
        ReviewerConfig {
            provider: ProviderConfig {
                base_api: self.bitbucket.uri(),
                project: "OPS".into(),
                repo: "ansible".into(),
                token: "bb-token".into(),
                timeout_secs: 5,
            },
            jira: with_jira.then(|| JiraConfig {
                base_url: self.jira.uri(),
                token: "jira-token".into(),
                timeout_secs: 5,
                key_filter: KeyFilter::default(),
            }),
            llm: LlmModelConfig {
                provider: LlmProvider::Ollama,
                model: "deepseek-r1:14b".into(),
                endpoint: self.ollama.uri(),
                num_ctx: Some(32_768),
                temperature: Some(0.2),
                timeout_secs: Some(5),
            },
            limits: ReviewLimits::default(),
            window: TimeDelta::hours(2),
            list_limit: 99,
            diff_context_lines: 10,
            dry_run: false,
            prompt_dump: PromptDumpConfig {
                enabled: dump_dir.is_some(),
                dir: dump_dir.map(|d| d.to_path_buf()).unwrap_or_default(),
            },
        }
    }
}

fn pr_json(id: u64, title: &str, age: TimeDelta) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "createdDate": (Utc::now() - age).timestamp_millis(),
        "toRef": {"id": REF, "displayId": "main"}
    })
}

async fn mount_list(server: &MockServer, prs: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests")))
        .and(query_param("state", "OPEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": prs,
            "isLastPage": true
        })))
        .mount(server)
        .await;
}

async fn mount_diff(server: &MockServer, id: u64, diff: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests/{id}.diff")))
        .and(query_param("contextLines", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(diff))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_raw(server: &MockServer, file: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/raw/{file}")))
        .and(query_param("at", REF))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_role_dir(server: &MockServer, sub: &str, content: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/browse/roles/nginx/{sub}")))
        .and(query_param("at", REF))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "children": {
                "values": [
                    {"path": {"toString": "main.yml", "name": "main.yml", "extension": "yml"}, "type": "FILE"}
                ],
                "isLastPage": true
            }
        })))
        .expect(1)
        .mount(server)
        .await;
    mount_raw(server, &format!("roles/nginx/{sub}/main.yml"), content).await;
}

async fn mount_issue(server: &MockServer, key: &str, summary: &str, links: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/api/2/issue/{key}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": key,
            "fields": {"summary": summary, "description": null, "issuelinks": links}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "deepseek-r1:14b",
            "stream": false,
            "options": {"num_ctx": 32768}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": answer},
            "done": true
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn sent_prompt(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    body["messages"][0]["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn recent_pr_is_reviewed_and_commented() {
    let s = Servers::start().await;
    let dump = tempfile::tempdir().unwrap();

    mount_list(
        &s.bitbucket,
        vec![
            pr_json(1, "Fix nginx config (ADMIN-123)", TimeDelta::minutes(30)),
            pr_json(2, "Old change (ADMIN-9)", TimeDelta::hours(5)),
        ],
    )
    .await;
    mount_diff(&s.bitbucket, 1, DIFF).await;
    mount_raw(&s.bitbucket, "roles/nginx/tasks/main.yml", "- name: install nginx\n").await;
    mount_raw(&s.bitbucket, "playbook.yml", "- hosts: web\n").await;
    mount_role_dir(&s.bitbucket, "defaults", "nginx_port: 80\n").await;
    mount_role_dir(&s.bitbucket, "vars", "nginx_user: www-data\n").await;
    mount_role_dir(&s.bitbucket, "handlers", "- name: restart nginx\n").await;
    mount_role_dir(&s.bitbucket, "meta", "dependencies: []\n").await;

    mount_issue(
        &s.jira,
        "ADMIN-123",
        "Upgrade nginx",
        json!([{"outwardIssue": {"key": "ADMIN-124"}}]),
    )
    .await;
    mount_issue(
        &s.jira,
        "ADMIN-124",
        "Security baseline",
        json!([{"inwardIssue": {"key": "ADMIN-123"}}]),
    )
    .await;

    let answer = "- Title: Unpinned package\n  Description: state=latest is not idempotent\n  Location: roles/nginx/tasks/main.yml";
    mount_chat(&s.ollama, &format!("<think>\nlet me look\n</think>\n{answer}")).await;

    Mock::given(method("POST"))
        .and(path(format!("{REPO}/pull-requests/1/comments")))
        .and(body_json(json!({"text": format!("{DISCLOSURE_NOTICE}  \n{answer}")})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
        .expect(1)
        .mount(&s.bitbucket)
        .await;

    let report = run_batch(&s.config(true, Some(dump.path()))).await.unwrap();

    assert_eq!(report.outcomes, vec![(1, PrOutcome::Commented)]);

    let prompt = sent_prompt(&s.ollama).await;
    for marker in [
        "=== ISSUE CONTEXT ===",
        "[ADMIN-123] Upgrade nginx",
        "[ADMIN-124] Security baseline",
        "=== FILE: roles/nginx/tasks/main.yml ===",
        "=== FILE: playbook.yml ===",
        "=== ROLE CONTEXT ===",
        "nginx_port: 80",
        "dependencies: []",
    ] {
        assert!(prompt.contains(marker), "prompt is missing {marker:?}");
    }

    let dumped = std::fs::read_to_string(dump.path().join("pr-1.txt")).unwrap();
    assert_eq!(dumped, prompt);
}

#[tokio::test]
async fn no_issues_answer_posts_nothing() {
    let s = Servers::start().await;

    mount_list(&s.bitbucket, vec![pr_json(3, "Tidy playbook", TimeDelta::minutes(5))]).await;
    mount_diff(
        &s.bitbucket,
        3,
        "diff --git a/playbook.yml b/playbook.yml\n--- a/playbook.yml\n+++ b/playbook.yml\n@@ -1 +1 @@\n-- hosts: all\n+- hosts: web\n",
    )
    .await;
    mount_raw(&s.bitbucket, "playbook.yml", "- hosts: all\n").await;
    mount_chat(&s.ollama, "<think>fine</think>\nNo issues found.").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&s.bitbucket)
        .await;

    let report = run_batch(&s.config(false, None)).await.unwrap();
    assert_eq!(report.outcomes, vec![(3, PrOutcome::NoIssues)]);

    let prompt = sent_prompt(&s.ollama).await;
    assert!(!prompt.contains("=== ISSUE CONTEXT ==="));
    assert!(!prompt.contains("=== ROLE CONTEXT ==="));
}

#[tokio::test]
async fn one_failing_pr_does_not_stop_the_batch() {
    let s = Servers::start().await;

    mount_list(
        &s.bitbucket,
        vec![
            pr_json(4, "Broken", TimeDelta::minutes(10)),
            pr_json(5, "Empty", TimeDelta::minutes(20)),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests/4.diff")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&s.bitbucket)
        .await;
    mount_diff(&s.bitbucket, 5, "  \n").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&s.ollama)
        .await;

    let report = run_batch(&s.config(false, None)).await.unwrap();

    assert!(matches!(report.outcome(4), Some(PrOutcome::Failed(Step::Diff, _))));
    assert_eq!(report.outcome(5), Some(&PrOutcome::Skipped("no changes to review".into())));
}

#[tokio::test]
async fn model_and_comment_failures_do_not_stop_the_batch() {
    let s = Servers::start().await;

    mount_list(
        &s.bitbucket,
        vec![
            pr_json(1, "Harden web hosts", TimeDelta::minutes(10)),
            pr_json(2, "Rework site", TimeDelta::minutes(15)),
        ],
    )
    .await;
    mount_diff(
        &s.bitbucket,
        1,
        "diff --git a/playbook.yml b/playbook.yml\n--- a/playbook.yml\n+++ b/playbook.yml\n@@ -1 +1 @@\n-- hosts: all\n+- hosts: web\n",
    )
    .await;
    mount_diff(
        &s.bitbucket,
        2,
        "diff --git a/site.yml b/site.yml\n--- a/site.yml\n+++ b/site.yml\n@@ -1 +1 @@\n-- import_playbook: a.yml\n+- import_playbook: b.yml\n",
    )
    .await;
    mount_raw(&s.bitbucket, "playbook.yml", "- hosts: all\n").await;
    mount_raw(&s.bitbucket, "site.yml", "- import_playbook: a.yml\n").await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("=== FILE: playbook.yml ==="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "- Title: Broad host pattern"},
            "done": true
        })))
        .expect(1)
        .mount(&s.ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("=== FILE: site.yml ==="))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .expect(1)
        .mount(&s.ollama)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{REPO}/pull-requests/1/comments")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&s.bitbucket)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/pull-requests/2/comments")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&s.bitbucket)
        .await;

    let report = run_batch(&s.config(false, None)).await.unwrap();

    assert_eq!(report.reviewed(), 2);
    assert_eq!(report.failed(), 2);
    assert!(matches!(report.outcome(1), Some(PrOutcome::Failed(Step::Comment, _))));
    assert!(matches!(report.outcome(2), Some(PrOutcome::Failed(Step::Llm, _))));
}

#[tokio::test]
async fn listing_failure_fails_the_batch() {
    let s = Servers::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&s.bitbucket)
        .await;

    let err = run_batch(&s.config(false, None)).await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn no_recent_prs_is_an_empty_report() {
    let s = Servers::start().await;
    mount_list(&s.bitbucket, vec![pr_json(6, "Stale", TimeDelta::hours(3))]).await;

    let report = run_batch(&s.config(false, None)).await.unwrap();
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn missing_target_ref_is_fetched_once_or_skipped() {
    let s = Servers::start().await;
    let now = Utc::now();
    mount_list(
        &s.bitbucket,
        vec![
            json!({"id": 7, "title": "a", "createdDate": now.timestamp_millis()}),
            json!({"id": 8, "title": "b", "createdDate": now.timestamp_millis()}),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests/7")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(7, "a", TimeDelta::zero())))
        .expect(1)
        .mount(&s.bitbucket)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pull-requests/8")))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": 8, "title": "b", "createdDate": now.timestamp_millis()}),
        ))
        .expect(1)
        .mount(&s.bitbucket)
        .await;
    mount_diff(&s.bitbucket, 7, "").await;

    let report = run_batch(&s.config(false, None)).await.unwrap();

    assert_eq!(
        report.outcomes,
        vec![
            (7, PrOutcome::Skipped("no changes to review".into())),
            (8, PrOutcome::Skipped("target ref unknown".into())),
        ]
    );
}
