//! Selection of recently created open pull requests.

use chrono::{DateTime, TimeDelta, Utc};
use git_context_engine::{BitbucketClient, PullRequestSummary};
use tracing::{debug, info};

use crate::errors::ReviewResult;

/// `true` when `created_at` lies strictly after `now - window`.
///
/// A PR created exactly at the cutoff is not recent. A window reaching past
/// the earliest representable date keeps everything.
pub fn is_recent(created_at: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now.checked_sub_signed(window).is_none_or(|cutoff| created_at > cutoff)
}

/// Keeps the PRs inside the window, preserving host order.
pub fn select_recent(
    prs: Vec<PullRequestSummary>,
    now: DateTime<Utc>,
    window: TimeDelta,
) -> Vec<PullRequestSummary> {
    prs.into_iter()
        .filter(|pr| {
            let keep = is_recent(pr.created_at, now, window);
            if !keep {
                debug!(pr = pr.id, created_at = %pr.created_at, "list: outside window");
            }
            keep
        })
        .collect()
}

/// Lists open PRs (one page of `limit`) and keeps those created within `window`.
pub async fn list_recent_pull_requests(
    client: &BitbucketClient,
    limit: u32,
    window: TimeDelta,
) -> ReviewResult<Vec<PullRequestSummary>> {
    let open = client.list_open_pull_requests(limit).await?;
    let total = open.len();
    let recent = select_recent(open, Utc::now(), window);
    info!(open = total, recent = recent.len(), "list: pull requests selected");
    Ok(recent)
}
