//! Push orchestration
//!
//! Turns a push selection (one branch, a tag, or a matrix of branches) into
//! a single `git push`, runs it through a [`ProcessExecutor`] and, when the
//! checked-out branch is rejected as non-fast-forward, pulls and retries the
//! same command once if that is allowed and safe.
//!
//! **Dependency**: the bundled [`GitCliExecutor`] requires git in PATH;
//! gix does not support push.
//!
//! # Authentication
//!
//! Pushes rely on git's configured authentication. `GIT_TERMINAL_PROMPT=0`
//! is always set, so a push that needs credentials fails instead of
//! hanging on a prompt.
//!
//! ## SSH
//! - Keys loaded in ssh-agent (`SSH_AUTH_SOCK`), or a key without passphrase
//! - `~/.ssh/config` is respected
//!
//! ```bash
//! eval "$(ssh-agent -s)"
//! ssh-add ~/.ssh/id_ed25519
//! ```
//!
//! ## HTTPS
//! - Credential helper: `git config --global credential.helper store`
//! - Or `GIT_ASKPASS` pointing at a script that prints the token
//!
//! # Troubleshooting
//!
//! ## "Permission denied" / "Authentication failed"
//! - `ssh-add -l` and `ssh -T git@github.com`
//! - `git config --get credential.helper`
//!
//! ## "Operation timed out"
//! - Check `git remote -v` and connectivity
//! - Raise the timeout with [`GitCliExecutor::with_timeout`]
//!
//! # Example
//!
//! ```no_run
//! use kodegen_git_push::{
//!     Answer, BranchPush, DecisionPrompt, Destination, GitCliExecutor, GixRepository,
//!     PromptKind, PushEngine, PushRequest, PushSettings, PushTarget,
//! };
//!
//! struct AlwaysYes;
//!
//! impl DecisionPrompt for AlwaysYes {
//!     fn ask(&self, _kind: &PromptKind) -> Answer {
//!         Answer::Yes
//!     }
//!
//!     fn confirm(&self, _kind: &PromptKind) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = GixRepository::discover(".").await?;
//! let executor = GitCliExecutor::new(reader.handle().work_dir()?);
//! let engine = PushEngine::new(reader, executor, AlwaysYes, PushSettings::default());
//!
//! let request = PushRequest::new(
//!     Destination::Remote("origin".into()),
//!     PushTarget::SingleBranch(BranchPush::new("main", "main")),
//! );
//! let outcome = engine.push(&request).await;
//! println!("succeeded: {}", outcome.succeeded());
//! # Ok(())
//! # }
//! ```

mod command;
mod engine;
mod executor;
mod guard;
mod matrix;
mod prompt;
mod rejection;
mod retry;
mod selection;
mod target;
mod tracking;

pub use command::{PushAction, PushCommand, PushScope, build_command};
pub use engine::{Declined, PreconditionError, PushEngine, PushRequest, PushSequenceOutcome};
pub use executor::{
    GitCliExecutor, OutputVisibility, ProcessExecutor, ProcessOutput, PullRequest, PushExecutor,
    PushOutcome,
};
pub use guard::{RetryContext, is_unsafe_to_auto_rebase};
pub use matrix::{BranchMatrix, MatrixFlag, MatrixRow};
pub use prompt::{Answer, DecisionPrompt, PromptKind};
pub use rejection::is_rejection;
pub use retry::{FailureReason, PushReport, PushState, RetryController, SuppressedRetry};
pub use selection::{PushMapping, default_remote, is_new_for_remote, suggest_remote_branch};
pub use target::{BranchPush, Destination, PushTarget, TagPush};
pub use tracking::{TrackingDecision, resolve_tracking};
