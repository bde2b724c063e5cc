//! Process collaborator and the push executor
//!
//! [`ProcessExecutor`] runs the external push/pull and reports exit status
//! plus captured text. [`GitCliExecutor`] is the git-binary implementation.
//! [`PushExecutor`] turns whatever the collaborator returns into a
//! [`PushOutcome`]; it never retries.

use std::path::PathBuf;
use std::process::Output;

use log::{debug, info, warn};

use super::command::PushCommand;
use crate::GitResult;
use crate::operations::git_cli::{
    GitCommandOpts, auth_error_message, is_auth_error, run_git_command,
};
use crate::operations::settings::ReconciliationStrategy;

/// Whether captured output should be shown to the user while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputVisibility {
    Visible,
    /// Used for the corrective pull of an automatic retry
    Hidden,
}

/// Raw result of an external git invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub exited_with_error: bool,
    pub captured_text: String,
}

impl ProcessOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            exited_with_error: false,
            captured_text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            exited_with_error: true,
            captured_text: text.into(),
        }
    }
}

/// Corrective pull requested by the retry controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub strategy: ReconciliationStrategy,
}

impl PullRequest {
    /// Arguments for the git binary.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = match self.strategy {
            ReconciliationStrategy::Merge => vec!["pull".to_string(), "--no-rebase".to_string()],
            ReconciliationStrategy::Rebase => vec!["pull".to_string(), "--rebase".to_string()],
            ReconciliationStrategy::FetchOnly => vec!["fetch".to_string()],
        };
        if let Some(remote) = &self.remote {
            args.push(remote.clone());
            if let Some(branch) = &self.branch
                && self.strategy != ReconciliationStrategy::FetchOnly
            {
                args.push(branch.clone());
            }
        }
        args
    }
}

/// Runs external push and pull operations.
#[allow(async_fn_in_trait)]
pub trait ProcessExecutor {
    async fn push(
        &self,
        command: &PushCommand,
        visibility: OutputVisibility,
    ) -> GitResult<ProcessOutput>;

    async fn pull(
        &self,
        request: &PullRequest,
        visibility: OutputVisibility,
    ) -> GitResult<ProcessOutput>;
}

/// [`ProcessExecutor`] that shells out to the git binary.
#[derive(Debug, Clone)]
pub struct GitCliExecutor {
    opts: GitCommandOpts,
    echo: bool,
}

impl GitCliExecutor {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            opts: GitCommandOpts::new(work_dir),
            echo: false,
        }
    }

    /// Set timeout in seconds (default: 300)
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.opts = self.opts.with_timeout(secs);
        self
    }

    /// Echo visible output to stderr as each command finishes.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn finish(&self, output: Output, target: &str, visibility: OutputVisibility) -> ProcessOutput {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut captured_text = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (true, _) => stderr.into_owned(),
            (false, true) => stdout.into_owned(),
            (false, false) => format!("{stdout}\n{stderr}"),
        };

        let exited_with_error = !output.status.success();
        if exited_with_error && is_auth_error(&captured_text) {
            captured_text.push('\n');
            captured_text.push_str(&auth_error_message(target));
        }

        if self.echo && visibility == OutputVisibility::Visible && !captured_text.is_empty() {
            eprintln!("{}", captured_text.trim_end());
        }

        ProcessOutput {
            exited_with_error,
            captured_text,
        }
    }
}

impl ProcessExecutor for GitCliExecutor {
    async fn push(
        &self,
        command: &PushCommand,
        visibility: OutputVisibility,
    ) -> GitResult<ProcessOutput> {
        info!("{command}");
        let output = run_git_command(&command.to_args(), &self.opts).await?;
        Ok(self.finish(output, command.destination().as_str(), visibility))
    }

    async fn pull(
        &self,
        request: &PullRequest,
        visibility: OutputVisibility,
    ) -> GitResult<ProcessOutput> {
        let args = request.to_args();
        info!("git {}", args.join(" "));
        let output = run_git_command(&args, &self.opts).await?;
        let target = request.remote.as_deref().unwrap_or("remote");
        Ok(self.finish(output, target, visibility))
    }
}

/// Structured result of one push dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub succeeded: bool,
    pub captured_text: String,
}

/// Dispatches a [`PushCommand`] through a [`ProcessExecutor`].
#[derive(Debug)]
pub struct PushExecutor<'a, X> {
    process: &'a X,
}

impl<'a, X: ProcessExecutor> PushExecutor<'a, X> {
    pub fn new(process: &'a X) -> Self {
        Self { process }
    }

    /// Run `command` once.
    ///
    /// Collaborator errors (spawn failure, timeout) become a failed outcome
    /// carrying the error text.
    pub async fn execute(&self, command: &PushCommand, visibility: OutputVisibility) -> PushOutcome {
        match self.process.push(command, visibility).await {
            Ok(output) => {
                debug!("push exited with error: {}", output.exited_with_error);
                PushOutcome {
                    succeeded: !output.exited_with_error,
                    captured_text: output.captured_text,
                }
            }
            Err(e) => {
                warn!("push to {} could not complete: {e}", command.destination());
                PushOutcome {
                    succeeded: false,
                    captured_text: e.to_string(),
                }
            }
        }
    }
}
