//! Push sequence driver
//!
//! [`PushEngine::push`] runs one user-initiated push from start to finish:
//! it validates the request, asks the confirmations that apply, builds the
//! command, snapshots the retry context and hands over to the
//! [`RetryController`]. Every step reports through [`PushSequenceOutcome`];
//! no step returns early with an error.

use log::{debug, info};
use thiserror::Error;

use super::command::build_command;
use super::executor::ProcessExecutor;
use super::guard::RetryContext;
use super::prompt::{DecisionPrompt, PromptKind};
use super::retry::{FailureReason, PushReport, RetryController};
use super::selection::{PushMapping, is_new_for_remote};
use super::target::{BranchPush, Destination, PushTarget};
use super::tracking::{TrackingDecision, resolve_tracking};
use crate::GitResult;
use crate::operations::repository::RepositoryReader;
use crate::operations::settings::PushSettings;

/// A push the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub destination: Destination,
    pub target: PushTarget,
}

impl PushRequest {
    pub fn new(destination: Destination, target: PushTarget) -> Self {
        Self { destination, target }
    }
}

/// Request cannot be pushed as selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Please select a destination directory")]
    MissingDestination,
    #[error("Please select a remote repository")]
    MissingRemote,
    #[error("Please select a branch to push")]
    MissingBranch,
    #[error("You need to select a tag to push or select \"Push all tags\".")]
    MissingTag,
    #[error("No branches are selected for push or delete")]
    EmptyMatrix,
}

/// The user stopped the sequence at a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Declined {
    #[error("Push of a new remote branch was not confirmed")]
    NewBranchForRemote,
    #[error("Push was cancelled at the tracking reference question")]
    TrackingCancelled,
}

/// How a push sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushSequenceOutcome {
    /// Nothing ran; the request was incomplete
    Precondition(PreconditionError),
    /// Nothing ran; the user said no
    Declined(Declined),
    /// The push ran; see the report
    Finished(PushReport),
}

impl PushSequenceOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Finished(report) if report.succeeded())
    }

    pub fn report(&self) -> Option<&PushReport> {
        match self {
            Self::Finished(report) => Some(report),
            _ => None,
        }
    }
}

/// Runs push sequences against one repository.
#[derive(Debug)]
pub struct PushEngine<R, X, P> {
    reader: R,
    executor: X,
    prompt: P,
    settings: PushSettings,
}

impl<R, X, P> PushEngine<R, X, P>
where
    R: RepositoryReader,
    X: ProcessExecutor,
    P: DecisionPrompt,
{
    pub fn new(reader: R, executor: X, prompt: P, settings: PushSettings) -> Self {
        Self {
            reader,
            executor,
            prompt,
            settings,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn settings(&self) -> &PushSettings {
        &self.settings
    }

    /// Give back the settings so the caller can persist them.
    pub fn into_settings(self) -> PushSettings {
        self.settings
    }

    /// Run one push sequence.
    pub async fn push(&self, request: &PushRequest) -> PushSequenceOutcome {
        if let Err(e) = check_preconditions(request) {
            info!("push not started: {e}");
            return PushSequenceOutcome::Precondition(e);
        }

        match self.prepare_and_run(request).await {
            Ok(outcome) => outcome,
            Err(e) => PushSequenceOutcome::Finished(PushReport::aborted(FailureReason::Collaborator(
                e.to_string(),
            ))),
        }
    }

    async fn prepare_and_run(&self, request: &PushRequest) -> GitResult<PushSequenceOutcome> {
        let destination = &request.destination;
        let target = &request.target;

        let tracking = match target {
            PushTarget::SingleBranch(branch) => {
                if let Some(remote) = destination.remote_name()
                    && !branch.push_all
                    && !self.confirm_new_branch(remote, branch).await?
                {
                    return Ok(PushSequenceOutcome::Declined(Declined::NewBranchForRemote));
                }
                match self.tracking_decision(branch).await? {
                    TrackingDecision::Cancel => {
                        return Ok(PushSequenceOutcome::Declined(Declined::TrackingCancelled));
                    }
                    decision => decision,
                }
            }
            PushTarget::Tag(_) | PushTarget::Matrix(_) => TrackingDecision::DoNotSet,
        };

        let mut command = build_command(target, destination, tracking);
        if let PushTarget::SingleBranch(_) = target {
            command = command.with_recurse_submodules(self.settings.recursive_submodules);
        }

        let active_branch = self.reader.current_branch().await?;
        let active_branch_remote = match &active_branch {
            Some(branch) => self.reader.config_value(&format!("branch.{branch}.remote")).await?,
            None => None,
        };
        let ctx = RetryContext::snapshot(
            target,
            destination,
            self.settings.reconciliation_strategy,
            active_branch,
            active_branch_remote,
        );
        debug!("retry context: {ctx:?}");

        info!("pushing {} to {destination}", target.kind());
        let report = RetryController::new(&self.reader, &self.executor, &self.settings)
            .run(&command, &ctx)
            .await;
        info!("push finished in state {:?}", report.state);
        Ok(PushSequenceOutcome::Finished(report))
    }

    /// Ask before creating a branch the remote does not know yet.
    async fn confirm_new_branch(&self, remote: &str, branch: &BranchPush) -> GitResult<bool> {
        let remote_branch = branch.remote.trim();
        let mapping = PushMapping::for_remote(&self.reader, remote).await?;
        let remote_refs = self.reader.remote_refs(remote).await?;
        let mapped = mapping.as_ref().and_then(|m| m.remote.as_deref());

        if !is_new_for_remote(remote_branch, mapped, &remote_refs) {
            return Ok(true);
        }

        Ok(self.prompt.confirm(&PromptKind::NewBranchForRemote {
            remote: remote.to_string(),
            remote_branch: remote_branch.to_string(),
        }))
    }

    async fn tracking_decision(&self, branch: &BranchPush) -> GitResult<TrackingDecision> {
        let name = branch.local.trim();
        let local = self
            .reader
            .local_refs()
            .await?
            .into_iter()
            .find(|r| r.name == name);
        let remotes = self.reader.remotes().await?;

        Ok(resolve_tracking(
            local.as_ref(),
            &branch.remote,
            branch.update_tracking,
            &remotes,
            &self.prompt,
        ))
    }
}

fn check_preconditions(request: &PushRequest) -> Result<(), PreconditionError> {
    match &request.destination {
        Destination::Url(_) if request.destination.is_blank() => {
            return Err(PreconditionError::MissingDestination);
        }
        Destination::Remote(_) if request.destination.is_blank() => {
            return Err(PreconditionError::MissingRemote);
        }
        _ => {}
    }

    match &request.target {
        PushTarget::SingleBranch(branch) if !branch.push_all && branch.local.trim().is_empty() => {
            Err(PreconditionError::MissingBranch)
        }
        PushTarget::Tag(tag) if !tag.push_all && tag.name.trim().is_empty() => {
            Err(PreconditionError::MissingTag)
        }
        PushTarget::Matrix(matrix) if matrix.build_actions().is_empty() => {
            Err(PreconditionError::EmptyMatrix)
        }
        _ => Ok(()),
    }
}
