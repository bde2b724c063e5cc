//! `kodegen_git_push` - Push orchestration over the git CLI and gix
//!
//! This library decides *what* push to request and *how* to react to its
//! outcome: it resolves branch, tag and multi-branch (matrix) push targets
//! into a single git push command, decides whether to set a tracking
//! reference, executes the push through a process collaborator and, when the
//! checked-out branch is rejected as non-fast-forward, performs a guarded
//! pull-then-retry at most once.
//!
//! Repository metadata is read through the gix (Gitoxide) library; the push
//! and pull themselves run through the git binary because gix does not
//! support push.

use std::path::PathBuf;

use thiserror::Error;

// Module declarations
pub mod operations;

// Re-export push orchestration
pub use operations::{
    Answer, BranchMatrix, BranchPush, DecisionPrompt, Declined, Destination, FailureReason,
    GitCliExecutor, GitCommandOpts, GixRepository, LocalRef, MatrixFlag, MatrixRow,
    OutputVisibility, PreconditionError, ProcessExecutor, ProcessOutput, PromptKind, PullRequest,
    PushAction, PushCommand, PushEngine, PushExecutor, PushMapping, PushOutcome, PushReport,
    PushRequest, PushScope, PushSequenceOutcome, PushSettings, PushState, PushTarget,
    ReconciliationStrategy, RecursiveSubmodules, RepositoryReader, RepositoryState, RetryContext,
    RetryController, SuppressedRetry, TagPush, TrackingDecision, build_command, default_remote,
    git_available, is_new_for_remote, is_rejection, is_unsafe_to_auto_rebase, open_repo,
    resolve_tracking, run_git_command, suggest_remote_branch,
};

/// Error types for push orchestration plumbing
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Gix error: {0}")]
    Gix(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Repository not found at path: {0}")]
    RepoNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Git operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<gix::open::Error> for GitError {
    fn from(e: gix::open::Error) -> Self {
        GitError::Gix(Box::new(e))
    }
}

impl From<gix::discover::Error> for GitError {
    fn from(e: gix::discover::Error) -> Self {
        GitError::Gix(Box::new(e))
    }
}

impl From<tokio::task::JoinError> for GitError {
    fn from(e: tokio::task::JoinError) -> Self {
        GitError::Join(e.to_string())
    }
}

/// Convenience result alias.
pub type GitResult<T> = Result<T, GitError>;

/// Strong-typed repository wrapper with cheap cloning.
///
/// Wraps a single `gix::Repository` instance. Cloning this handle creates
/// a new repository instance that shares underlying data structures (refs, objects)
/// but has independent thread-local buffers, making it Send-safe.
///
/// # Thread Safety
///
/// The wrapped `gix::Repository` is `Send` but not `Sync`.
/// Each clone can be safely moved into `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct RepoHandle {
    inner: gix::Repository,
}

impl RepoHandle {
    /// Create from an existing `gix::Repository`.
    #[inline]
    pub fn new(inner: gix::Repository) -> Self {
        Self { inner }
    }

    /// Access the underlying `gix::Repository`.
    #[inline]
    pub fn raw(&self) -> &gix::Repository {
        &self.inner
    }

    /// Clone the underlying repository for use in blocking tasks.
    #[inline]
    pub fn clone_inner(&self) -> gix::Repository {
        self.inner.clone()
    }

    /// Working directory git commands should run in.
    ///
    /// Bare repositories have no working tree and cannot be pushed from by
    /// this crate.
    pub fn work_dir(&self) -> GitResult<PathBuf> {
        self.inner
            .workdir()
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| GitError::InvalidInput("Repository has no working directory".to_string()))
    }

    /// Path of the `.git` directory.
    #[inline]
    pub fn git_dir(&self) -> PathBuf {
        self.inner.git_dir().to_path_buf()
    }
}
