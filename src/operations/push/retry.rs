//! Rejection handling and the single guarded retry
//!
//! The controller owns the state machine for one push sequence:
//!
//! ```text
//! Idle -> Pushed -> Succeeded
//!                -> RejectedOtherReason
//!                -> RejectedActiveBranch -> Failed (auto-pull off, fetch-only, unsafe rebase)
//!                                        -> PullAttempted -> Failed (pull not clean)
//!                                                         -> Retrying -> Succeeded | Failed
//! ```
//!
//! A command is re-executed at most once, and always unchanged.

use log::{debug, info, warn};
use thiserror::Error;

use super::command::PushCommand;
use super::executor::{
    OutputVisibility, ProcessExecutor, ProcessOutput, PullRequest, PushExecutor,
};
use super::guard::{RetryContext, is_unsafe_to_auto_rebase};
use super::rejection::is_rejection;
use crate::operations::repository::RepositoryReader;
use crate::operations::settings::{PushSettings, ReconciliationStrategy};

const FETCH_ONLY_ADVISORY: &str = "Can not perform auto pull, when merge option is set to fetch.";
const UNSAFE_REBASE_ADVISORY: &str = "Can not perform auto pull, when merge option is set to rebase \
     and one of the commits that are about to be rebased is a merge.";

/// States visited by a push sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    Idle,
    Pushed,
    Succeeded,
    RejectedOtherReason,
    RejectedActiveBranch,
    PullAttempted,
    Retrying,
    Failed,
}

/// Why automatic correction was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SuppressedRetry {
    /// The reconciliation strategy only fetches
    #[error("{}", FETCH_ONLY_ADVISORY)]
    FetchOnly,
    /// A rebase would rewrite a merge commit
    #[error("{}", UNSAFE_REBASE_ADVISORY)]
    UnsafeRebase,
}

/// Why a sequence ended without success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The push failed and no retry applies
    #[error("Push failed")]
    Execution,
    #[error("Push was rejected and automatic pull is disabled")]
    AutoPullDisabled,
    #[error("{0}")]
    RetrySuppressed(SuppressedRetry),
    /// The pull failed, could not run, or left a merge/rebase in progress
    #[error("Pull did not complete cleanly; resolve it manually and push again")]
    PullIncomplete,
    #[error("Push failed again after pulling")]
    RetryFailed,
    /// A collaborator could not answer
    #[error("{0}")]
    Collaborator(String),
}

/// Result of a push sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Terminal state
    pub state: PushState,
    pub reason: Option<FailureReason>,
    /// Output of every step, advisories included
    pub captured_text: String,
    /// Every visited state in order, starting with `Idle`
    pub transitions: Vec<PushState>,
    pub retried: bool,
}

impl PushReport {
    pub fn succeeded(&self) -> bool {
        self.state == PushState::Succeeded
    }

    /// Report for a sequence that failed before anything was pushed.
    pub(crate) fn aborted(reason: FailureReason) -> Self {
        let captured_text = match &reason {
            FailureReason::Collaborator(message) => message.clone(),
            _ => String::new(),
        };
        Self {
            state: PushState::Failed,
            reason: Some(reason),
            captured_text,
            transitions: vec![PushState::Idle, PushState::Failed],
            retried: false,
        }
    }
}

struct Trace {
    transitions: Vec<PushState>,
    captured_text: String,
    retried: bool,
}

impl Trace {
    fn new() -> Self {
        Self {
            transitions: vec![PushState::Idle],
            captured_text: String::new(),
            retried: false,
        }
    }

    fn enter(&mut self, state: PushState) {
        debug!("push state: {state:?}");
        self.transitions.push(state);
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.captured_text.is_empty() && !self.captured_text.ends_with('\n') {
            self.captured_text.push('\n');
        }
        self.captured_text.push_str(text);
    }

    fn succeed(mut self) -> PushReport {
        self.enter(PushState::Succeeded);
        self.finish(PushState::Succeeded, None)
    }

    fn fail(mut self, reason: FailureReason) -> PushReport {
        self.enter(PushState::Failed);
        self.finish(PushState::Failed, Some(reason))
    }

    fn finish(self, state: PushState, reason: Option<FailureReason>) -> PushReport {
        PushReport {
            state,
            reason,
            captured_text: self.captured_text,
            transitions: self.transitions,
            retried: self.retried,
        }
    }
}

/// Drives one push command through rejection handling.
#[derive(Debug)]
pub struct RetryController<'a, R, X> {
    reader: &'a R,
    process: &'a X,
    settings: &'a PushSettings,
}

impl<'a, R, X> RetryController<'a, R, X>
where
    R: RepositoryReader,
    X: ProcessExecutor,
{
    pub fn new(reader: &'a R, process: &'a X, settings: &'a PushSettings) -> Self {
        Self {
            reader,
            process,
            settings,
        }
    }

    /// Execute `command`, and on a rejection of the active branch pull and
    /// retry it once when that is allowed and safe.
    pub async fn run(&self, command: &PushCommand, ctx: &RetryContext) -> PushReport {
        let executor = PushExecutor::new(self.process);
        let mut trace = Trace::new();

        let outcome = executor.execute(command, OutputVisibility::Visible).await;
        trace.enter(PushState::Pushed);
        trace.append(&outcome.captured_text);

        if outcome.succeeded {
            return trace.succeed();
        }

        let active_branch = ctx.active_branch.as_deref().unwrap_or_default();
        if !is_rejection(&outcome.captured_text, active_branch) {
            trace.enter(PushState::RejectedOtherReason);
            return trace.finish(PushState::RejectedOtherReason, Some(FailureReason::Execution));
        }

        trace.enter(PushState::RejectedActiveBranch);
        info!("push of `{active_branch}` rejected as non-fast-forward");

        if !self.settings.auto_pull_on_rejected {
            return trace.fail(FailureReason::AutoPullDisabled);
        }

        let strategy = self.settings.reconciliation_strategy;
        if strategy == ReconciliationStrategy::FetchOnly {
            warn!("{FETCH_ONLY_ADVISORY}");
            trace.append(FETCH_ONLY_ADVISORY);
            return trace.fail(FailureReason::RetrySuppressed(SuppressedRetry::FetchOnly));
        }

        match is_unsafe_to_auto_rebase(ctx, self.reader).await {
            Ok(false) => {}
            Ok(true) => {
                warn!("{UNSAFE_REBASE_ADVISORY}");
                trace.append(UNSAFE_REBASE_ADVISORY);
                return trace.fail(FailureReason::RetrySuppressed(SuppressedRetry::UnsafeRebase));
            }
            Err(e) => return trace.fail(FailureReason::Collaborator(e.to_string())),
        }

        let pull = PullRequest {
            remote: Some(ctx.pushed_remote.clone()).filter(|r| !r.is_empty()),
            branch: Some(ctx.selected_remote_branch.clone()).filter(|b| !b.is_empty()),
            strategy,
        };
        trace.enter(PushState::PullAttempted);
        let pulled = match self.process.pull(&pull, OutputVisibility::Hidden).await {
            Ok(output) => output,
            Err(e) => {
                warn!("pull from {} could not complete: {e}", ctx.pushed_remote);
                ProcessOutput::failure(e.to_string())
            }
        };
        trace.append(&pulled.captured_text);
        if pulled.exited_with_error {
            return trace.fail(FailureReason::PullIncomplete);
        }

        match self.reader.state().await {
            Ok(state) if state.needs_manual_intervention() => {
                warn!("pull left the repository in state {state:?}");
                return trace.fail(FailureReason::PullIncomplete);
            }
            Ok(_) => {}
            Err(e) => return trace.fail(FailureReason::Collaborator(e.to_string())),
        }

        trace.enter(PushState::Retrying);
        trace.retried = true;
        let retry = executor.execute(command, OutputVisibility::Visible).await;
        trace.append(&retry.captured_text);

        if retry.succeeded {
            trace.succeed()
        } else {
            trace.fail(FailureReason::RetryFailed)
        }
    }
}
