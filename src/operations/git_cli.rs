//! Git CLI wrapper used for push and pull
//!
//! Single source of truth for:
//! - Spawning the git binary with a non-interactive, locale-stable environment
//! - Timeout handling with proper child process cleanup
//! - Recognising authentication failures and producing setup advice

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use log::debug;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;

use crate::{GitError, GitResult};

/// Check if git binary is available
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Options for running a git command
#[derive(Debug, Clone)]
pub struct GitCommandOpts {
    /// Working directory for the command
    pub work_dir: PathBuf,
    /// Timeout in seconds (default: 300)
    pub timeout_secs: u64,
}

impl GitCommandOpts {
    /// Create options with work_dir and default timeout
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            timeout_secs: 300,
        }
    }

    /// Set timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Run a git command with proper environment setup
///
/// Handles:
/// - Setting GIT_TERMINAL_PROMPT=0 to prevent hanging on credential prompts
/// - Setting LC_ALL=C so rejection lines are always in English
/// - Timeout handling with proper child process cleanup
///
/// A non-zero exit status is *not* an error here; callers inspect
/// `Output::status` themselves. Only spawn failures and timeouts are errors.
pub async fn run_git_command<S: AsRef<str>>(args: &[S], opts: &GitCommandOpts) -> GitResult<Output> {
    let timeout_duration = Duration::from_secs(opts.timeout_secs);
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();

    let mut cmd = TokioCommand::new("git");
    cmd.current_dir(&opts.work_dir);
    cmd.args(&args);

    // A timed-out child is killed when the handle goes out of scope
    cmd.kill_on_drop(true);

    // Prevent credential prompts from hanging
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    // Force English output for consistent parsing
    cmd.env("LC_ALL", "C");
    cmd.env("LANG", "C");

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    debug!("running git {}", args.join(" "));

    let mut child = cmd.spawn().map_err(GitError::Io)?;

    // Drain pipes concurrently with the wait so a chatty child cannot block
    // on a full pipe buffer.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let read_stdout = async {
        let mut buf = Vec::new();
        if let Some(out) = stdout_pipe.as_mut() {
            let _ = out.read_to_end(&mut buf).await;
        }
        buf
    };
    let read_stderr = async {
        let mut buf = Vec::new();
        if let Some(err) = stderr_pipe.as_mut() {
            let _ = err.read_to_end(&mut buf).await;
        }
        buf
    };

    let waited = async {
        let (status, stdout, stderr) = tokio::join!(child.wait(), read_stdout, read_stderr);
        status.map(|status| Output { status, stdout, stderr })
    };

    tokio::select! {
        result = waited => result.map_err(GitError::Io),
        () = tokio::time::sleep(timeout_duration) => {
            Err(GitError::Timeout(opts.timeout_secs))
        }
    }
}

/// Check if an error message indicates an authentication failure
pub fn is_auth_error(stderr: &str) -> bool {
    let s = stderr.to_lowercase();
    s.contains("authentication")
        || s.contains("permission denied")
        || s.contains("could not read username")
        || s.contains("could not read password")
        || s.contains("host key verification failed")
        || s.contains("repository not found") // Often means no access
}

/// Generate helpful message for an authentication failure against `url`
pub fn auth_error_message(url: &str) -> String {
    let is_ssh = url.contains("git@") || url.starts_with("ssh://");

    if is_ssh {
        format!(
            r#"SSH authentication failed for '{url}'.

Ensure an SSH key is loaded in ssh-agent (`ssh-add -l`) and that its
public key is registered with the Git host. Test with `ssh -T git@<host>`.
"#
        )
    } else {
        format!(
            r#"HTTPS authentication failed for '{url}'.

Configure a credential helper, for example:
  git config --global credential.helper store
"#
        )
    }
}
