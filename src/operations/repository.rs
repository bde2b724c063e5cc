//! Repository metadata reader
//!
//! The push engine only ever *reads* repository state: remotes, local
//! branches with their tracking configuration, remote-tracking branches,
//! config values, merge commits in a range and whether an operation (merge,
//! rebase) is in progress. [`RepositoryReader`] is the seam; [`GixRepository`]
//! is the production implementation on top of gix.

use std::path::Path;

use gix::bstr::ByteSlice;
use log::debug;

use crate::{GitError, GitResult, RepoHandle};

/// A local branch and its tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRef {
    /// Short branch name (e.g. `main`)
    pub name: String,
    /// `branch.<name>.remote`, if configured
    pub tracking_remote: Option<String>,
    /// `branch.<name>.merge` with `refs/heads/` stripped, if configured
    pub merge_with: Option<String>,
}

impl LocalRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracking_remote: None,
            merge_with: None,
        }
    }

    pub fn tracking(mut self, remote: impl Into<String>, merge_with: impl Into<String>) -> Self {
        self.tracking_remote = Some(remote.into());
        self.merge_with = Some(merge_with.into());
        self
    }

    /// Whether a non-empty tracking remote is configured.
    pub fn has_tracking_remote(&self) -> bool {
        self.tracking_remote.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Whether this branch tracks `remote`.
    pub fn tracks(&self, remote: &str) -> bool {
        self.tracking_remote.as_deref() == Some(remote)
    }
}

/// Operation the working copy is in the middle of, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    Clean,
    Merging,
    Rebasing,
    /// Cherry-pick, revert, bisect, am
    OtherOperation,
}

impl RepositoryState {
    /// True when a merge or rebase was left unfinished.
    pub fn needs_manual_intervention(self) -> bool {
        matches!(self, Self::Merging | Self::Rebasing)
    }
}

/// Read access to repository metadata.
#[allow(async_fn_in_trait)]
pub trait RepositoryReader {
    /// Configured remote names.
    async fn remotes(&self) -> GitResult<Vec<String>>;

    /// Local branches with tracking info.
    async fn local_refs(&self) -> GitResult<Vec<LocalRef>>;

    /// Short branch names known for `remote` (remote-tracking refs).
    async fn remote_refs(&self, remote: &str) -> GitResult<Vec<String>>;

    /// A single config value, e.g. `remote.origin.push`.
    async fn config_value(&self, key: &str) -> GitResult<Option<String>>;

    /// Checked-out branch, `None` when HEAD is detached.
    async fn current_branch(&self) -> GitResult<Option<String>>;

    /// Whether a merge commit is reachable from `tip` but not from `base`.
    async fn has_merge_commit_between(&self, base: &str, tip: &str) -> GitResult<bool>;

    /// Operation in progress in the working copy.
    async fn state(&self) -> GitResult<RepositoryState>;
}

/// Open a repository at `path` (no discovery).
pub async fn open_repo<P: AsRef<Path>>(path: P) -> GitResult<RepoHandle> {
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        return Err(GitError::RepoNotFound(path));
    }
    let repo = tokio::task::spawn_blocking(move || gix::open(path)).await??;
    Ok(RepoHandle::new(repo))
}

/// [`RepositoryReader`] backed by gix.
#[derive(Debug, Clone)]
pub struct GixRepository {
    handle: RepoHandle,
}

impl GixRepository {
    pub fn new(handle: RepoHandle) -> Self {
        Self { handle }
    }

    /// Discover the repository containing `path`.
    pub async fn discover<P: AsRef<Path>>(path: P) -> GitResult<Self> {
        let path = path.as_ref().to_path_buf();
        let repo = tokio::task::spawn_blocking(move || gix::discover(path)).await??;
        Ok(Self::new(RepoHandle::new(repo)))
    }

    pub fn handle(&self) -> &RepoHandle {
        &self.handle
    }

    async fn blocking<T, F>(&self, f: F) -> GitResult<T>
    where
        T: Send + 'static,
        F: FnOnce(gix::Repository) -> GitResult<T> + Send + 'static,
    {
        let repo = self.handle.clone_inner();
        tokio::task::spawn_blocking(move || f(repo)).await?
    }
}

fn config_string(repo: &gix::Repository, key: &str) -> Option<String> {
    repo.config_snapshot()
        .string(key)
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
}

impl RepositoryReader for GixRepository {
    async fn remotes(&self) -> GitResult<Vec<String>> {
        self.blocking(|repo| {
            Ok(repo
                .remote_names()
                .into_iter()
                .filter_map(|name| name.to_str().ok().map(str::to_string))
                .collect())
        })
        .await
    }

    async fn local_refs(&self) -> GitResult<Vec<LocalRef>> {
        self.blocking(|repo| {
            let platform = repo.references().map_err(|e| GitError::Gix(Box::new(e)))?;
            let branches = platform
                .local_branches()
                .map_err(|e| GitError::Gix(Box::new(e)))?;

            let mut refs = Vec::new();
            for reference in branches {
                let reference = reference.map_err(GitError::Gix)?;
                let Ok(name) = reference.name().shorten().to_str() else {
                    debug!("skipping non UTF-8 branch name");
                    continue;
                };
                let section = format!("branch.{name}");
                refs.push(LocalRef {
                    name: name.to_string(),
                    tracking_remote: config_string(&repo, &format!("{section}.remote")),
                    merge_with: config_string(&repo, &format!("{section}.merge"))
                        .map(|m| m.trim_start_matches("refs/heads/").to_string()),
                });
            }
            Ok(refs)
        })
        .await
    }

    async fn remote_refs(&self, remote: &str) -> GitResult<Vec<String>> {
        let prefix = format!("{remote}/");
        self.blocking(move |repo| {
            let platform = repo.references().map_err(|e| GitError::Gix(Box::new(e)))?;
            let branches = platform
                .remote_branches()
                .map_err(|e| GitError::Gix(Box::new(e)))?;

            let mut names = Vec::new();
            for reference in branches {
                let reference = reference.map_err(GitError::Gix)?;
                let Ok(short) = reference.name().shorten().to_str() else {
                    continue;
                };
                if let Some(branch) = short.strip_prefix(&prefix)
                    && branch != "HEAD"
                {
                    names.push(branch.to_string());
                }
            }
            Ok(names)
        })
        .await
    }

    async fn config_value(&self, key: &str) -> GitResult<Option<String>> {
        let key = key.to_string();
        self.blocking(move |repo| Ok(config_string(&repo, &key))).await
    }

    async fn current_branch(&self) -> GitResult<Option<String>> {
        self.blocking(|repo| {
            let head = repo.head().map_err(|e| GitError::Gix(Box::new(e)))?;
            Ok(head
                .referent_name()
                .and_then(|name| name.shorten().to_str().ok().map(str::to_string)))
        })
        .await
    }

    async fn has_merge_commit_between(&self, base: &str, tip: &str) -> GitResult<bool> {
        let base = base.to_string();
        let tip = tip.to_string();
        self.blocking(move |repo| {
            let tip_id = repo
                .rev_parse_single(tip.as_str())
                .map_err(|e| GitError::Gix(Box::new(e)))?
                .detach();
            let base_id = match repo.rev_parse_single(base.as_str()) {
                Ok(id) => Some(id.detach()),
                Err(_) => {
                    // Remote branch not fetched yet: everything on tip is "new"
                    debug!("base `{base}` does not resolve; walking all of `{tip}`");
                    None
                }
            };

            let walk = repo.rev_walk([tip_id]).with_hidden(base_id);
            let walk = walk.all().map_err(|e| GitError::Gix(Box::new(e)))?;

            for info in walk {
                let info = info.map_err(|e| GitError::Gix(Box::new(e)))?;
                let commit = repo
                    .find_commit(info.id)
                    .map_err(|e| GitError::Gix(Box::new(e)))?;
                if commit.parent_ids().count() > 1 {
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .await
    }

    async fn state(&self) -> GitResult<RepositoryState> {
        use gix::state::InProgress;

        self.blocking(|repo| {
            Ok(match repo.state() {
                None => RepositoryState::Clean,
                Some(InProgress::Merge) => RepositoryState::Merging,
                Some(
                    InProgress::Rebase
                    | InProgress::RebaseInteractive
                    | InProgress::ApplyMailboxRebase,
                ) => RepositoryState::Rebasing,
                Some(_) => RepositoryState::OtherOperation,
            })
        })
        .await
    }
}
