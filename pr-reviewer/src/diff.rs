//! Diff fetcher.

use git_context_engine::BitbucketClient;
use tracing::debug;

use crate::errors::ReviewResult;

/// Raw unified diff of a PR, or `None` when there is nothing to review.
pub async fn fetch_diff(
    client: &BitbucketClient,
    pr_id: u64,
    context_lines: u32,
) -> ReviewResult<Option<String>> {
    let diff = client.get_diff(pr_id, context_lines).await?;
    if diff.trim().is_empty() {
        debug!(pr = pr_id, "diff: empty");
        return Ok(None);
    }
    debug!(pr = pr_id, chars = diff.len(), "diff: fetched");
    Ok(Some(diff))
}
