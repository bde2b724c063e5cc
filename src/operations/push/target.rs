//! Push destinations and targets

use std::fmt;

use super::matrix::BranchMatrix;

/// Where a push goes: a configured remote or a raw URL/path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Remote(String),
    Url(String),
}

impl Destination {
    /// Text handed to `git push` as the repository argument.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(name) => name.trim(),
            Self::Url(url) => url.trim(),
        }
    }

    /// Remote name, `None` for URL destinations.
    pub fn remote_name(&self) -> Option<&str> {
        match self {
            Self::Remote(name) => Some(name.trim()),
            Self::Url(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push of one local branch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchPush {
    /// Local branch (or `HEAD`)
    pub local: String,
    /// Branch name on the remote
    pub remote: String,
    /// Push all branches instead (`--all`)
    pub push_all: bool,
    pub force: bool,
    /// Set the tracking reference without asking
    pub update_tracking: bool,
}

impl BranchPush {
    pub fn new(local: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
            ..Self::default()
        }
    }

    pub fn push_all(mut self, push_all: bool) -> Self {
        self.push_all = push_all;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn update_tracking(mut self, update_tracking: bool) -> Self {
        self.update_tracking = update_tracking;
        self
    }
}

/// Push of one tag, or of all tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagPush {
    pub name: String,
    /// Push all tags, ignoring `name`
    pub push_all: bool,
    pub force: bool,
}

impl TagPush {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            push_all: true,
            ..Self::default()
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// What the user chose to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    SingleBranch(BranchPush),
    Tag(TagPush),
    Matrix(BranchMatrix),
}

impl PushTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SingleBranch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::Matrix(_) => "matrix",
        }
    }
}
