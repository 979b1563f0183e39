//! Comment publisher.
//!
//! Posts the cleaned model answer as one general PR comment, prefixed with
//! the AI disclosure notice.
//!
//! - Empty answers and the exact "no issues" sentinel are not posted.
//! - Dry-run: log the would-be comment without calling the API.

use git_context_engine::BitbucketClient;
use tracing::info;

use crate::errors::ReviewResult;
use crate::truncate::hard_limit;

/// The model's answer when it finds nothing to report.
pub const NO_ISSUES_SENTINEL: &str = "No issues found.";

pub const DISCLOSURE_NOTICE: &str =
    "Please note that this comment is generated by an AI model and may not be fully accurate or reliable.";

pub const COMMENT_TRUNCATION_MARKER: &str = "\n\n[... comment truncated ...]";

/// What happened to a review answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Posted,
    NoIssues,
    DryRun,
}

/// Comment body for `review`, or `None` when there is nothing to post.
///
/// The notice is followed by two spaces and a newline (a markdown line break).
pub fn compose_comment(review: &str, max_chars: usize) -> Option<String> {
    let review = review.trim();
    if review.is_empty() || review == NO_ISSUES_SENTINEL {
        return None;
    }
    let body = format!("{DISCLOSURE_NOTICE}  \n{review}");
    Some(hard_limit(&body, max_chars, COMMENT_TRUNCATION_MARKER))
}

/// Posts the review to PR `pr_id` unless it reports no issues.
pub async fn publish_review(
    client: &BitbucketClient,
    pr_id: u64,
    review: &str,
    max_chars: usize,
    dry_run: bool,
) -> ReviewResult<PublishOutcome> {
    let Some(body) = compose_comment(review, max_chars) else {
        info!(pr = pr_id, "comment: no issues reported, nothing posted");
        return Ok(PublishOutcome::NoIssues);
    };

    if dry_run {
        info!(pr = pr_id, chars = body.len(), "comment: dry run, would post:\n{body}");
        return Ok(PublishOutcome::DryRun);
    }

    client.post_comment(pr_id, &body).await?;
    info!(pr = pr_id, chars = body.len(), "comment: posted");
    Ok(PublishOutcome::Posted)
}
