// kodegen-git-push: push a branch, a tag or a set of branches, pulling and
// retrying once when the checked-out branch is rejected.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use kodegen_git_push::{
    Answer, BranchMatrix, BranchPush, DecisionPrompt, Destination, GitCliExecutor,
    GixRepository, MatrixFlag, PromptKind, PushEngine, PushRequest, PushSequenceOutcome,
    PushSettings, PushTarget, ReconciliationStrategy, RecursiveSubmodules, RepositoryReader,
    default_remote, suggest_remote_branch,
};
use log::debug;

#[derive(Parser, Debug)]
#[command(name = "kodegen-git-push", about = "Push with guarded automatic pull-and-retry")]
struct Cli {
    /// Local branch to push (default: current branch)
    branch: Option<String>,

    /// Branch name on the remote (default: tracked branch or the local name)
    remote_branch: Option<String>,

    /// Repository path
    #[arg(short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Remote to push to (default: tracking remote, then origin)
    #[arg(long, conflicts_with = "url")]
    remote: Option<String>,

    /// Push to a URL or path instead of a configured remote; bare `--url`
    /// reuses the most recent one
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    url: Option<String>,

    /// List remembered URL destinations and exit
    #[arg(long)]
    recent: bool,

    /// Push a tag instead of a branch
    #[arg(long, conflicts_with_all = ["all_tags", "matrix"])]
    tag: Option<String>,

    /// Push all tags
    #[arg(long, conflicts_with = "matrix")]
    all_tags: bool,

    /// Push tags as last time: all of them if the previous tag push did
    #[arg(long, conflicts_with = "matrix")]
    tags: bool,

    /// Push several branches at once, selected with --update/--force-row/--delete
    #[arg(long)]
    matrix: bool,

    /// Matrix: push this branch
    #[arg(long, value_name = "BRANCH", requires = "matrix")]
    update: Vec<String>,

    /// Matrix: force push this branch
    #[arg(long, value_name = "BRANCH", requires = "matrix")]
    force_row: Vec<String>,

    /// Matrix: delete this branch on the remote
    #[arg(long, value_name = "BRANCH", requires = "matrix")]
    delete: Vec<String>,

    /// Matrix: do not preselect branches that already exist on the remote
    #[arg(long, requires = "matrix")]
    clear: bool,

    /// Force push
    #[arg(short, long)]
    force: bool,

    /// Push all branches
    #[arg(long)]
    all: bool,

    /// Set the upstream of the pushed branch without asking
    #[arg(short = 'u', long)]
    set_upstream: bool,

    /// Pull and retry once when the current branch is rejected
    #[arg(long, overrides_with = "no_auto_pull")]
    auto_pull: bool,

    #[arg(long, overrides_with = "auto_pull", hide = true)]
    no_auto_pull: bool,

    /// How the corrective pull reconciles
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Submodule handling for branch pushes
    #[arg(long, value_enum)]
    recurse_submodules: Option<SubmodulesArg>,

    /// Settings file (default: .git/kodegen-push.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Timeout for each git invocation, in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Answer yes to every question
    #[arg(short, long)]
    yes: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Merge,
    Rebase,
    FetchOnly,
}

impl From<StrategyArg> for ReconciliationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Merge => Self::Merge,
            StrategyArg::Rebase => Self::Rebase,
            StrategyArg::FetchOnly => Self::FetchOnly,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SubmodulesArg {
    None,
    Check,
    OnDemand,
}

impl From<SubmodulesArg> for RecursiveSubmodules {
    fn from(arg: SubmodulesArg) -> Self {
        match arg {
            SubmodulesArg::None => Self::None,
            SubmodulesArg::Check => Self::Check,
            SubmodulesArg::OnDemand => Self::OnDemand,
        }
    }
}

/// Answers engine questions on the terminal.
struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    fn read_answer(&self, question: &str, choices: &str) -> Option<String> {
        eprint!("{question} [{choices}] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_ascii_lowercase()),
        }
    }
}

impl DecisionPrompt for TerminalPrompt {
    fn ask(&self, kind: &PromptKind) -> Answer {
        if self.assume_yes {
            return Answer::Yes;
        }
        match self.read_answer(&kind.to_string(), "y/n/c").as_deref() {
            Some("y" | "yes") => Answer::Yes,
            Some("n" | "no") => Answer::No,
            _ => Answer::Cancel,
        }
    }

    fn confirm(&self, kind: &PromptKind) -> bool {
        self.assume_yes
            || matches!(
                self.read_answer(&kind.to_string(), "y/N").as_deref(),
                Some("y" | "yes")
            )
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let reader = GixRepository::discover(&cli.repo)
        .await
        .with_context(|| format!("no git repository at {}", cli.repo.display()))?;
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PushSettings::default_path(reader.handle()));
    let mut settings = PushSettings::load_or_seed(&settings_path, &reader).await?;

    if cli.recent {
        for url in &settings.recent_destinations {
            println!("{url}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let request = build_request(&cli, &reader, &settings).await?;
    apply_overrides(&cli, &mut settings);
    debug!("request: {request:?}");

    let executor = GitCliExecutor::new(reader.handle().work_dir()?)
        .with_timeout(cli.timeout)
        .echo(true);
    let prompt = TerminalPrompt {
        assume_yes: cli.yes,
    };
    let engine = PushEngine::new(reader, executor, prompt, settings);
    let outcome = engine.push(&request).await;

    let mut settings = engine.into_settings();
    if settings.record_push(&request.destination, &outcome) {
        settings
            .save(&settings_path)
            .await
            .with_context(|| format!("could not write {}", settings_path.display()))?;
    }

    Ok(report(&outcome))
}

fn apply_overrides(cli: &Cli, settings: &mut PushSettings) {
    if cli.auto_pull {
        settings.auto_pull_on_rejected = true;
    }
    if cli.no_auto_pull {
        settings.auto_pull_on_rejected = false;
    }
    if let Some(strategy) = cli.strategy {
        settings.reconciliation_strategy = strategy.into();
    }
    if let Some(mode) = cli.recurse_submodules {
        settings.recursive_submodules = mode.into();
    }
    if cli.tag.is_some() || cli.all_tags {
        settings.push_all_tags = cli.all_tags;
    }
}

async fn build_request(
    cli: &Cli,
    reader: &GixRepository,
    settings: &PushSettings,
) -> Result<PushRequest> {
    let current = reader.current_branch().await?;
    let current_remote = match &current {
        Some(branch) => reader.config_value(&format!("branch.{branch}.remote")).await?,
        None => None,
    };

    let destination = match (&cli.url, &cli.remote) {
        (Some(url), _) if url.trim().is_empty() => match settings.last_destination() {
            Some(last) => Destination::Url(last.to_string()),
            None => bail!("no remembered URL; pass --url <URL>"),
        },
        (Some(url), _) => Destination::Url(url.clone()),
        (None, Some(remote)) => Destination::Remote(remote.clone()),
        (None, None) => {
            let remotes = reader.remotes().await?;
            match default_remote(current_remote.as_deref(), &remotes) {
                Some(remote) => Destination::Remote(remote),
                None => bail!("no remote configured; pass --remote or --url"),
            }
        }
    };

    let target = if cli.tag.is_some() || cli.all_tags || cli.tags {
        let tag = settings.tag_push(cli.tag.as_deref(), cli.all_tags);
        PushTarget::Tag(tag.force(cli.force))
    } else if cli.matrix {
        PushTarget::Matrix(build_matrix(cli, reader, &destination).await?)
    } else {
        let local = cli
            .branch
            .clone()
            .or_else(|| current.clone())
            .unwrap_or_else(|| "HEAD".to_string());
        let remote_branch = match &cli.remote_branch {
            Some(name) => name.clone(),
            None => {
                let local_ref = reader
                    .local_refs()
                    .await?
                    .into_iter()
                    .find(|r| r.name == local);
                match (local_ref, destination.remote_name()) {
                    (Some(local_ref), Some(remote)) => suggest_remote_branch(&local_ref, remote),
                    _ => local.clone(),
                }
            }
        };
        PushTarget::SingleBranch(
            BranchPush::new(local, remote_branch)
                .push_all(cli.all)
                .force(cli.force)
                .update_tracking(cli.set_upstream),
        )
    };

    Ok(PushRequest::new(destination, target))
}

async fn build_matrix(
    cli: &Cli,
    reader: &GixRepository,
    destination: &Destination,
) -> Result<BranchMatrix> {
    let remote = destination.remote_name().unwrap_or_default();
    let remote_refs = if remote.is_empty() {
        Vec::new()
    } else {
        reader.remote_refs(remote).await?
    };
    let mut matrix = BranchMatrix::populate(remote, &reader.local_refs().await?, &remote_refs);

    if cli.clear {
        for row in 0..matrix.len() {
            matrix.set_flag(row, MatrixFlag::Push, false)?;
        }
    }

    let selections = [
        (&cli.update, MatrixFlag::Push),
        (&cli.force_row, MatrixFlag::Force),
        (&cli.delete, MatrixFlag::Delete),
    ];
    for (names, flag) in selections {
        for name in names {
            let Some(row) = matrix.position(name) else {
                bail!("branch `{name}` is neither local nor on `{remote}`");
            };
            matrix.set_flag(row, flag, true)?;
        }
    }

    Ok(matrix)
}

fn report(outcome: &PushSequenceOutcome) -> ExitCode {
    match outcome {
        PushSequenceOutcome::Precondition(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
        PushSequenceOutcome::Declined(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        PushSequenceOutcome::Finished(report) if report.succeeded() => {
            if report.retried {
                println!("Pushed after pulling remote changes");
            } else {
                println!("Pushed");
            }
            ExitCode::SUCCESS
        }
        PushSequenceOutcome::Finished(report) => {
            if let Some(reason) = &report.reason {
                eprintln!("{reason}");
            }
            ExitCode::FAILURE
        }
    }
}
