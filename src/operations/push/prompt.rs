//! User decisions requested by a push sequence
//!
//! The engine only says which question needs answering; rendering and
//! wording belong to the caller.

use std::fmt;

/// Question the engine needs answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// `local` has no tracking reference; add one to `remote_branch`?
    TrackingReference { local: String, remote_branch: String },
    /// `remote_branch` looks new for `remote`; push anyway?
    NewBranchForRemote { remote: String, remote_branch: String },
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackingReference { local, remote_branch } => write!(
                f,
                "The branch {local} does not have a tracking reference. \
                 Do you want to add a tracking reference to {remote_branch}?"
            ),
            Self::NewBranchForRemote { remote, remote_branch } => write!(
                f,
                "The branch {remote_branch} seems to be a new branch for {remote}. \
                 Are you sure you want to push this branch?"
            ),
        }
    }
}

/// Answer to a three-way question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

/// Source of user decisions.
pub trait DecisionPrompt {
    /// Yes / no / cancel.
    fn ask(&self, kind: &PromptKind) -> Answer;

    /// Ok / cancel; `true` to proceed.
    fn confirm(&self, kind: &PromptKind) -> bool;
}

impl<P: DecisionPrompt + ?Sized> DecisionPrompt for &P {
    fn ask(&self, kind: &PromptKind) -> Answer {
        (**self).ask(kind)
    }

    fn confirm(&self, kind: &PromptKind) -> bool {
        (**self).confirm(kind)
    }
}
