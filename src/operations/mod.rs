//! Push operations module
//!
//! Repository reads go through gix; push and pull run through the git CLI.

pub mod git_cli;
pub mod push;
pub mod repository;
pub mod settings;

// Re-export operation types and functions
pub use git_cli::{GitCommandOpts, git_available, run_git_command};
pub use push::{
    Answer, BranchMatrix, BranchPush, DecisionPrompt, Declined, Destination, FailureReason,
    GitCliExecutor, MatrixFlag, MatrixRow, OutputVisibility, PreconditionError, ProcessExecutor,
    ProcessOutput, PromptKind, PullRequest, PushAction, PushCommand, PushEngine, PushExecutor,
    PushMapping, PushOutcome, PushReport, PushRequest, PushScope, PushSequenceOutcome, PushState,
    PushTarget, RetryContext, RetryController, SuppressedRetry, TagPush, TrackingDecision,
    build_command, default_remote, is_new_for_remote, is_rejection, is_unsafe_to_auto_rebase,
    resolve_tracking, suggest_remote_branch,
};
pub use repository::{GixRepository, LocalRef, RepositoryReader, RepositoryState, open_repo};
pub use settings::{PushSettings, ReconciliationStrategy, RecursiveSubmodules};
