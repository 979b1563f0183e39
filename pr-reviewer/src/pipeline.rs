//! Batch pipeline: list recent PRs, review each one in turn.
//!
//! Per PR: target ref → diff → issues → repo context → prompt → model →
//! publish. Failures inside one PR are logged and recorded in the
//! [`BatchReport`]; only the initial listing can fail the batch.

use std::fmt;
use std::time::Instant;

use ai_llm_service::OllamaService;
use git_context_engine::{BitbucketClient, ContentCache, PullRequestSummary};
use issue_context::{JiraClient, resolve_issue_context};
use tracing::{error, info, instrument, warn};

use crate::config::{ReviewLimits, ReviewerConfig};
use crate::context::assemble_repo_context;
use crate::diff::fetch_diff;
use crate::errors::ReviewResult;
use crate::lister::list_recent_pull_requests;
use crate::prompt::build_prompt;
use crate::publish::{PublishOutcome, publish_review};
use crate::review::request_review;
use crate::telemetry::prompt_dump::{PromptDumpConfig, dump_prompt};

/// Pipeline step that can fail a PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    List,
    Diff,
    Llm,
    Comment,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::List => "list",
            Step::Diff => "diff",
            Step::Llm => "llm",
            Step::Comment => "comment",
        })
    }
}

/// Result of reviewing one PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    Commented,
    NoIssues,
    DryRun,
    Skipped(String),
    Failed(Step, String),
}

/// Outcomes of one batch, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(u64, PrOutcome)>,
}

impl BatchReport {
    pub fn reviewed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn commented(&self) -> usize {
        self.count(|o| matches!(o, PrOutcome::Commented))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PrOutcome::Failed(..)))
    }

    pub fn outcome(&self, pr_id: u64) -> Option<&PrOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == pr_id)
            .map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&PrOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    fn log_summary(&self) {
        info!(
            prs = self.reviewed(),
            commented = self.commented(),
            no_issues = self.count(|o| matches!(o, PrOutcome::NoIssues)),
            dry_run = self.count(|o| matches!(o, PrOutcome::DryRun)),
            skipped = self.count(|o| matches!(o, PrOutcome::Skipped(_))),
            failed = self.failed(),
            "batch finished"
        );
    }
}

/// Clients and settings shared by every PR of a batch.
#[derive(Debug)]
pub struct Reviewer {
    bitbucket: BitbucketClient,
    jira: Option<JiraClient>,
    llm: OllamaService,
    limits: ReviewLimits,
    diff_context_lines: u32,
    dry_run: bool,
    prompt_dump: PromptDumpConfig,
}

impl Reviewer {
    pub fn from_config(cfg: &ReviewerConfig) -> ReviewResult<Self> {
        let jira = cfg.jira.as_ref().map(JiraClient::from_config).transpose()?;
        if jira.is_none() {
            info!("issues: JIRA_BASE_URL not set, issue context disabled");
        }
        Ok(Self {
            bitbucket: cfg.provider.client()?,
            jira,
            llm: OllamaService::new(cfg.llm.clone())?,
            limits: cfg.limits.clone(),
            diff_context_lines: cfg.diff_context_lines,
            dry_run: cfg.dry_run,
            prompt_dump: cfg.prompt_dump.clone(),
        })
    }

    pub fn bitbucket(&self) -> &BitbucketClient {
        &self.bitbucket
    }

    /// Runs every step for one PR. Never fails: errors become outcomes.
    #[instrument(skip_all, fields(pr = pr.id))]
    pub async fn review_pull_request(&self, pr: &PullRequestSummary) -> PrOutcome {
        let t0 = Instant::now();

        let Some(target_ref) = self.resolve_target_ref(pr).await else {
            return PrOutcome::Skipped("target ref unknown".into());
        };

        let diff = match fetch_diff(&self.bitbucket, pr.id, self.diff_context_lines).await {
            Ok(Some(diff)) => diff,
            Ok(None) => {
                info!("diff: empty, nothing to review");
                return PrOutcome::Skipped("no changes to review".into());
            }
            Err(e) => {
                error!("diff: {e}");
                return PrOutcome::Failed(Step::Diff, e.to_string());
            }
        };

        let issues = match &self.jira {
            Some(jira) => resolve_issue_context(jira, &pr.title, &pr.description).await,
            None => Vec::new(),
        };
        info!(count = issues.len(), "issues: resolved");

        let mut cache = ContentCache::new();
        let ctx =
            assemble_repo_context(&self.bitbucket, &mut cache, &diff, &target_ref, &self.limits)
                .await;

        let prompt = build_prompt(&issues, &ctx, &self.limits);
        dump_prompt(&self.prompt_dump, pr.id, &prompt);
        info!(
            files = ctx.files.len(),
            roles = ctx.roles.len(),
            prompt_chars = prompt.chars().count(),
            "context: prompt ready"
        );

        let review = match request_review(&self.llm, pr.id, &prompt).await {
            Ok(review) => review,
            Err(e) => {
                error!("llm: {e}");
                return PrOutcome::Failed(Step::Llm, e.to_string());
            }
        };

        let outcome = match publish_review(
            &self.bitbucket,
            pr.id,
            &review,
            self.limits.max_comment_chars,
            self.dry_run,
        )
        .await
        {
            Ok(PublishOutcome::Posted) => PrOutcome::Commented,
            Ok(PublishOutcome::NoIssues) => PrOutcome::NoIssues,
            Ok(PublishOutcome::DryRun) => PrOutcome::DryRun,
            Err(e) => {
                error!("comment: {e}");
                PrOutcome::Failed(Step::Comment, e.to_string())
            }
        };

        info!("pr done in {} ms", t0.elapsed().as_millis());
        outcome
    }

    /// Target ref from the summary, else from one detail fetch.
    async fn resolve_target_ref(&self, pr: &PullRequestSummary) -> Option<String> {
        if let Some(r) = &pr.target_ref {
            return Some(r.clone());
        }
        match self.bitbucket.get_pull_request(pr.id).await {
            Ok(detail) if detail.target_ref.is_some() => detail.target_ref,
            Ok(_) => {
                warn!("list: target ref missing in PR detail, skipping");
                None
            }
            Err(e) => {
                warn!("list: PR detail fetch failed, skipping: {e}");
                None
            }
        }
    }
}

/// Reviews every open PR created within the configured window.
///
/// Returns an error only when the PR list cannot be fetched (or the clients
/// cannot be built); per-PR failures are part of the report.
pub async fn run_batch(cfg: &ReviewerConfig) -> ReviewResult<BatchReport> {
    let reviewer = Reviewer::from_config(cfg)?;

    let prs = list_recent_pull_requests(reviewer.bitbucket(), cfg.list_limit, cfg.window)
        .await
        .inspect_err(|e| error!("{}: {e}", Step::List))?;

    let mut report = BatchReport::default();
    if prs.is_empty() {
        info!("list: no recent pull requests");
        return Ok(report);
    }

    for pr in &prs {
        info!(pr = pr.id, title = %pr.title, "reviewing pull request");
        let outcome = reviewer.review_pull_request(pr).await;
        report.outcomes.push((pr.id, outcome));
    }

    report.log_summary();
    Ok(report)
}
