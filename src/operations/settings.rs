//! Persisted push settings
//!
//! Settings are read when a push is built and treated as read-only for the
//! rest of the sequence. They are written back only after a push actually
//! ran, see [`PushSettings::record_push`].

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::push::{Destination, PushSequenceOutcome, TagPush};
use super::repository::RepositoryReader;
use crate::{GitResult, RepoHandle};

/// File name used inside the `.git` directory.
pub const SETTINGS_FILE_NAME: &str = "kodegen-push.json";

/// How many URL destinations are remembered.
const RECENT_DESTINATIONS_LIMIT: usize = 30;

/// How remote changes are incorporated by the corrective pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStrategy {
    #[default]
    Merge,
    Rebase,
    /// Fetch only; nothing is merged or rebased automatically.
    FetchOnly,
}

impl ReconciliationStrategy {
    /// Map git's `pull.rebase` value.
    pub fn from_pull_rebase(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("true" | "merges" | "interactive" | "i" | "m" | "preserve" | "p") => Self::Rebase,
            _ => Self::Merge,
        }
    }
}

/// `--recurse-submodules` behaviour for branch pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursiveSubmodules {
    #[default]
    None,
    /// Refuse to push when a submodule commit is not on any remote.
    Check,
    /// Push submodules that need it first.
    OnDemand,
}

impl RecursiveSubmodules {
    pub fn as_flag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Check => Some("--recurse-submodules=check"),
            Self::OnDemand => Some("--recurse-submodules=on-demand"),
        }
    }
}

/// Settings consumed by a push sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushSettings {
    pub push_all_tags: bool,
    pub auto_pull_on_rejected: bool,
    pub recursive_submodules: RecursiveSubmodules,
    pub reconciliation_strategy: ReconciliationStrategy,
    /// URL destinations, most recent first.
    pub recent_destinations: Vec<String>,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            push_all_tags: false,
            auto_pull_on_rejected: false,
            recursive_submodules: RecursiveSubmodules::None,
            reconciliation_strategy: ReconciliationStrategy::Merge,
            recent_destinations: Vec::new(),
        }
    }
}

impl PushSettings {
    /// Default settings location for a repository.
    pub fn default_path(repo: &RepoHandle) -> PathBuf {
        repo.git_dir().join(SETTINGS_FILE_NAME)
    }

    /// Load settings from `path`, `None` when the file does not exist.
    pub async fn load(path: &Path) -> GitResult<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load settings, seeding defaults from git config when no file exists.
    pub async fn load_or_seed<R: RepositoryReader>(path: &Path, reader: &R) -> GitResult<Self> {
        if let Some(settings) = Self::load(path).await? {
            return Ok(settings);
        }
        let pull_rebase = match reader.config_value("pull.rebase").await {
            Ok(value) => value,
            Err(e) => {
                warn!("could not read pull.rebase: {e}");
                None
            }
        };
        debug!("no push settings at {}, seeding from git config", path.display());
        Ok(Self {
            reconciliation_strategy: ReconciliationStrategy::from_pull_rebase(pull_rebase.as_deref()),
            ..Self::default()
        })
    }

    /// Write settings as pretty JSON.
    pub async fn save(&self, path: &Path) -> GitResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Tag selection for a tag push.
    ///
    /// An explicit "all tags" request or a tag name wins; with neither, the
    /// remembered `push_all_tags` choice decides. A blank result is left for
    /// the engine to reject as a missing tag.
    pub fn tag_push(&self, name: Option<&str>, all_requested: bool) -> TagPush {
        if all_requested {
            return TagPush::all();
        }
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => TagPush::new(name),
            None if self.push_all_tags => TagPush::all(),
            None => TagPush::new(""),
        }
    }

    /// Most recently used URL destination.
    pub fn last_destination(&self) -> Option<&str> {
        self.recent_destinations.first().map(String::as_str)
    }

    /// Fold a finished sequence into the settings.
    ///
    /// Returns `true` when the push ran and the settings should be saved.
    /// Sequences stopped by a precondition or a declined confirmation leave
    /// the settings untouched.
    pub fn record_push(
        &mut self,
        destination: &Destination,
        outcome: &PushSequenceOutcome,
    ) -> bool {
        if outcome.report().is_none() {
            return false;
        }
        if let Destination::Url(url) = destination {
            self.remember_destination(url);
        }
        true
    }

    /// Remember a URL destination, moving it to the front.
    pub fn remember_destination(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        self.recent_destinations.retain(|d| d != url);
        self.recent_destinations.insert(0, url.to_string());
        self.recent_destinations.truncate(RECENT_DESTINATIONS_LIMIT);
    }
}
