//! Defaults for the push selection
//!
//! Which remote to preselect, which remote branch to suggest for a local
//! branch, and whether that remote branch looks new.

use log::debug;

use crate::GitResult;
use crate::operations::repository::{LocalRef, RepositoryReader};

const DEFAULT_REMOTE_NAME: &str = "origin";

/// Default push mapping of a remote, from `remote.<name>.push`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushMapping {
    pub local: Option<String>,
    pub remote: Option<String>,
}

impl PushMapping {
    /// Parse a `local:remote` refspec. A leading `+` is ignored and missing
    /// halves stay `None`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let value = value.strip_prefix('+').unwrap_or(value);
        if value.is_empty() {
            return Self::default();
        }

        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        match value.split_once(':') {
            Some((local, remote)) => Self {
                local: non_empty(local),
                remote: non_empty(remote),
            },
            None => Self {
                local: non_empty(value),
                remote: None,
            },
        }
    }

    /// Read the mapping configured for `remote`, if any.
    pub async fn for_remote<R: RepositoryReader>(reader: &R, remote: &str) -> GitResult<Option<Self>> {
        let key = format!("remote.{remote}.push");
        let mapping = reader
            .config_value(&key)
            .await?
            .map(|value| Self::parse(&value))
            .filter(|m| m.local.is_some() || m.remote.is_some());
        debug!("{key}: {mapping:?}");
        Ok(mapping)
    }
}

/// Remote to preselect.
///
/// The current branch's tracking remote wins. Without one, `origin` is used
/// when several remotes exist, otherwise the only remote.
pub fn default_remote(current_branch_remote: Option<&str>, remotes: &[String]) -> Option<String> {
    if let Some(remote) = current_branch_remote.map(str::trim).filter(|r| !r.is_empty()) {
        return Some(remote.to_string());
    }

    match remotes {
        [] => None,
        [only] => Some(only.clone()),
        _ => Some(
            remotes
                .iter()
                .find(|r| r.as_str() == DEFAULT_REMOTE_NAME)
                .unwrap_or(&remotes[0])
                .clone(),
        ),
    }
}

/// Remote branch name to suggest for pushing `local` to `remote`.
///
/// A branch tracking `remote` suggests its merge target; any other branch
/// suggests its own name.
pub fn suggest_remote_branch(local: &LocalRef, remote: &str) -> String {
    match local.merge_with.as_deref() {
        Some(merge) if local.tracks(remote) && !merge.is_empty() => merge.to_string(),
        _ => local.name.clone(),
    }
}

/// Whether pushing to `remote_branch` would create a new branch.
///
/// It is new when it is neither the remote side of the remote's default push
/// mapping nor one of the remote's known branches.
pub fn is_new_for_remote(
    remote_branch: &str,
    default_mapping_remote: Option<&str>,
    remote_refs: &[String],
) -> bool {
    let remote_branch = remote_branch.trim();
    if remote_branch.is_empty() {
        return false;
    }
    if default_mapping_remote.is_some_and(|m| m == remote_branch) {
        return false;
    }
    !remote_refs.iter().any(|r| r == remote_branch)
}
