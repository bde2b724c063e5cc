//! Push command construction
//!
//! [`build_command`] turns a resolved [`PushTarget`] into one immutable
//! [`PushCommand`]. It never fails: validating the user's selection is the
//! engine's job and happens before a command is built.

use std::fmt;

use super::target::{Destination, PushTarget};
use super::tracking::TrackingDecision;
use crate::operations::settings::RecursiveSubmodules;

const HEAD: &str = "HEAD";

/// One ref update requested from the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushAction {
    /// Source ref; `None` deletes `remote`
    pub local: Option<String>,
    pub remote: String,
    pub force: bool,
    pub delete: bool,
}

impl PushAction {
    /// Update `remote` from `local`.
    pub fn update(local: &str, remote: &str, force: bool) -> Self {
        Self {
            local: Some(local.trim().to_string()),
            remote: remote.trim().to_string(),
            force,
            delete: false,
        }
    }

    /// Delete `remote` on the destination.
    pub fn delete(remote: &str) -> Self {
        Self {
            local: None,
            remote: remote.trim().to_string(),
            force: false,
            delete: true,
        }
    }

    /// Push tag `name` to the same tag name on the remote.
    pub fn tag(name: &str, force: bool) -> Self {
        let full = format!("refs/tags/{}", name.trim());
        Self {
            local: Some(full.clone()),
            remote: full,
            force,
            delete: false,
        }
    }

    /// Render as a git refspec.
    pub fn refspec(&self) -> String {
        let plus = if self.force { "+" } else { "" };
        match self.local.as_deref() {
            None => format!(":{}", self.remote),
            Some(local) if self.remote.is_empty() => format!("{plus}{local}"),
            // HEAD is not a branch name the remote knows; qualify the target
            Some(HEAD) if !self.remote.starts_with("refs/") => {
                format!("{plus}{HEAD}:refs/heads/{}", self.remote)
            }
            Some(local) => format!("{plus}{local}:{}", self.remote),
        }
    }
}

/// Which refs the command covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    /// Exactly the listed actions
    Refs,
    /// `--all`
    AllBranches,
    /// `--tags`
    AllTags,
}

/// A fully resolved push request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommand {
    destination: Destination,
    scope: PushScope,
    actions: Vec<PushAction>,
    /// Only meaningful for the `--all`/`--tags` scopes
    force_all: bool,
    set_upstream: bool,
    recurse_submodules: RecursiveSubmodules,
}

impl PushCommand {
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn scope(&self) -> PushScope {
        self.scope
    }

    pub fn actions(&self) -> &[PushAction] {
        &self.actions
    }

    pub fn set_upstream(&self) -> bool {
        self.set_upstream
    }

    pub fn recurse_submodules(&self) -> RecursiveSubmodules {
        self.recurse_submodules
    }

    /// Copy of this command with a submodule check mode.
    ///
    /// Only single-branch pushes carry one; tag and matrix pushes never do.
    pub fn with_recurse_submodules(mut self, mode: RecursiveSubmodules) -> Self {
        self.recurse_submodules = mode;
        self
    }

    /// Arguments for the git binary, starting with `push`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["push".to_string()];
        if self.force_all {
            args.push("--force".to_string());
        }
        if self.set_upstream {
            args.push("--set-upstream".to_string());
        }
        if let Some(flag) = self.recurse_submodules.as_flag() {
            args.push(flag.to_string());
        }
        match self.scope {
            PushScope::Refs => {}
            PushScope::AllBranches => args.push("--all".to_string()),
            PushScope::AllTags => args.push("--tags".to_string()),
        }
        args.push(self.destination.as_str().to_string());
        args.extend(self.actions.iter().map(PushAction::refspec));
        args
    }
}

impl fmt::Display for PushCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", self.to_args().join(" "))
    }
}

/// Build the push command for `target`.
pub fn build_command(
    target: &PushTarget,
    destination: &Destination,
    tracking: TrackingDecision,
) -> PushCommand {
    let mut command = PushCommand {
        destination: destination.clone(),
        scope: PushScope::Refs,
        actions: Vec::new(),
        force_all: false,
        set_upstream: false,
        recurse_submodules: RecursiveSubmodules::None,
    };

    match target {
        PushTarget::SingleBranch(branch) => {
            command.set_upstream = tracking == TrackingDecision::Set;
            if branch.push_all {
                command.scope = PushScope::AllBranches;
                command.force_all = branch.force;
            } else {
                command
                    .actions
                    .push(PushAction::update(&branch.local, &branch.remote, branch.force));
            }
        }
        PushTarget::Tag(tag) => {
            if tag.push_all {
                command.scope = PushScope::AllTags;
                command.force_all = tag.force;
            } else {
                command.actions.push(PushAction::tag(&tag.name, tag.force));
            }
        }
        PushTarget::Matrix(matrix) => {
            command.actions = matrix.build_actions();
        }
    }

    command
}
