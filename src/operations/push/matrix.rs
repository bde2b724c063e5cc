//! Multi-branch push matrix
//!
//! One row per push candidate. Within a row `push`, `force` and `delete` are
//! mutually exclusive: setting one clears the other two.

use std::collections::HashSet;

use log::debug;

use super::command::PushAction;
use crate::operations::repository::LocalRef;
use crate::{GitError, GitResult};

/// Selectable column of a matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixFlag {
    Push,
    Force,
    Delete,
}

/// One candidate ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    /// `None` for remote-only rows (delete candidates)
    pub local: Option<String>,
    pub remote: String,
    pub is_new_on_remote: bool,
    push: bool,
    force: bool,
    delete: bool,
}

impl MatrixRow {
    pub fn new(local: Option<String>, remote: impl Into<String>, is_new_on_remote: bool) -> Self {
        Self {
            local,
            remote: remote.into(),
            is_new_on_remote,
            push: false,
            force: false,
            delete: false,
        }
    }

    pub fn push(&self) -> bool {
        self.push
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn delete(&self) -> bool {
        self.delete
    }

    pub fn get(&self, flag: MatrixFlag) -> bool {
        match flag {
            MatrixFlag::Push => self.push,
            MatrixFlag::Force => self.force,
            MatrixFlag::Delete => self.delete,
        }
    }

    /// Last write wins: a `true` clears the sibling flags.
    fn set(&mut self, flag: MatrixFlag, value: bool) {
        if value {
            self.push = false;
            self.force = false;
            self.delete = false;
        }
        match flag {
            MatrixFlag::Push => self.push = value,
            MatrixFlag::Force => self.force = value,
            MatrixFlag::Delete => self.delete = value,
        }
    }

    fn action(&self) -> Option<PushAction> {
        if self.push || self.force {
            let local = self.local.as_deref()?;
            Some(PushAction::update(local, &self.remote, self.force))
        } else if self.delete {
            Some(PushAction::delete(&self.remote))
        } else {
            None
        }
    }
}

/// Ordered table of push candidates for one remote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchMatrix {
    rows: Vec<MatrixRow>,
}

impl BranchMatrix {
    pub fn new(rows: Vec<MatrixRow>) -> Self {
        Self { rows }
    }

    /// Seed the matrix for `remote`.
    ///
    /// Every local branch gets a row mapped to its merge target when it
    /// tracks `remote`, else to its own name. Rows whose remote branch
    /// already exists are pre-selected for push. Remote branches left over
    /// are appended unselected so they can be marked for deletion.
    pub fn populate(remote: &str, local_refs: &[LocalRef], remote_refs: &[String]) -> Self {
        let remote = remote.trim();
        let known: HashSet<&str> = remote_refs.iter().map(String::as_str).collect();
        let mut consumed: HashSet<&str> = HashSet::new();
        let mut rows = Vec::with_capacity(local_refs.len() + remote_refs.len());

        for local in local_refs {
            let remote_name = match local.merge_with.as_deref() {
                Some(merge_with) if local.tracks(remote) && !merge_with.is_empty() => merge_with,
                _ => local.name.as_str(),
            };
            let exists = known.contains(remote_name);
            let mut row = MatrixRow::new(Some(local.name.clone()), remote_name, !exists);
            row.push = exists;
            consumed.insert(remote_name);
            rows.push(row);
        }

        let local_names: HashSet<&str> = local_refs.iter().map(|l| l.name.as_str()).collect();
        for remote_ref in remote_refs {
            let name = remote_ref.as_str();
            if consumed.contains(name) || local_names.contains(name) {
                continue;
            }
            // Duplicate remote refs yield one row
            consumed.insert(name);
            rows.push(MatrixRow::new(None, name, false));
        }

        debug!("populated push matrix for `{remote}` with {} rows", rows.len());
        Self { rows }
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the row whose local or remote name is `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.local.as_deref() == Some(name))
            .or_else(|| self.rows.iter().position(|r| r.remote == name))
    }

    /// Set one flag of a row, enforcing mutual exclusion.
    ///
    /// Push/Force cannot be set on a row without a local branch.
    pub fn set_flag(&mut self, row: usize, flag: MatrixFlag, value: bool) -> GitResult<()> {
        let len = self.rows.len();
        let entry = self
            .rows
            .get_mut(row)
            .ok_or_else(|| GitError::InvalidInput(format!("Matrix row {row} out of range ({len} rows)")))?;

        if value && flag != MatrixFlag::Delete && entry.local.is_none() {
            return Err(GitError::InvalidInput(format!(
                "Remote branch `{}` has no local branch to push",
                entry.remote
            )));
        }

        entry.set(flag, value);
        Ok(())
    }

    /// Push actions in row order; unselected rows are skipped.
    pub fn build_actions(&self) -> Vec<PushAction> {
        self.rows.iter().filter_map(MatrixRow::action).collect()
    }
}
