//! Retry context snapshot and the rebase-safety guard

use log::debug;

use super::target::{Destination, PushTarget};
use crate::GitResult;
use crate::operations::repository::RepositoryReader;
use crate::operations::settings::ReconciliationStrategy;

/// State captured when a push is dispatched and reused by its one retry.
///
/// Nothing here is re-read from live selection state later: the selection
/// may have changed by the time a rejection is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// Rebase strategy and a plain single-branch push to a named remote
    pub candidate_for_rebase_retry: bool,
    /// Checked-out branch, `None` for a detached HEAD
    pub active_branch: Option<String>,
    /// `branch.<active>.remote`
    pub active_branch_remote: Option<String>,
    /// Local branch that was pushed
    pub pushed_branch: String,
    /// Remote (or URL) that was pushed to
    pub pushed_remote: String,
    /// Branch name on the remote
    pub selected_remote_branch: String,
}

impl RetryContext {
    pub fn snapshot(
        target: &PushTarget,
        destination: &Destination,
        strategy: ReconciliationStrategy,
        active_branch: Option<String>,
        active_branch_remote: Option<String>,
    ) -> Self {
        let (pushed_branch, selected_remote_branch, plain_branch_push) = match target {
            PushTarget::SingleBranch(branch) => {
                (branch.local.trim().to_string(), branch.remote.trim().to_string(), !branch.push_all)
            }
            _ => (String::new(), String::new(), false),
        };

        Self {
            candidate_for_rebase_retry: strategy == ReconciliationStrategy::Rebase
                && destination.remote_name().is_some()
                && plain_branch_push,
            active_branch,
            active_branch_remote,
            pushed_branch,
            pushed_remote: destination.as_str().to_string(),
            selected_remote_branch,
        }
    }

    /// The pushed branch is the checked-out one, pushed to its own remote.
    pub fn pushed_active_branch_to_its_remote(&self) -> bool {
        self.active_branch.as_deref() == Some(self.pushed_branch.as_str())
            && self.active_branch_remote.as_deref() == Some(self.pushed_remote.as_str())
    }
}

/// Whether an automatic pull would rebase a merge commit.
pub async fn is_unsafe_to_auto_rebase<R: RepositoryReader>(
    ctx: &RetryContext,
    reader: &R,
) -> GitResult<bool> {
    if !ctx.candidate_for_rebase_retry || !ctx.pushed_active_branch_to_its_remote() {
        return Ok(false);
    }

    let base = format!("{}/{}", ctx.pushed_remote, ctx.selected_remote_branch);
    let has_merge = reader
        .has_merge_commit_between(&base, &ctx.pushed_branch)
        .await?;
    debug!("merge commit in {base}..{}: {has_merge}", ctx.pushed_branch);
    Ok(has_merge)
}
