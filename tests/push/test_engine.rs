//! End-to-end push sequences against fake collaborators.

use kodegen_git_push::{
    Answer, BranchMatrix, BranchPush, Declined, Destination, FailureReason, LocalRef,
    PreconditionError, ProcessOutput, PromptKind, PushEngine, PushRequest, PushSequenceOutcome,
    PushSettings, PushState, PushTarget, ReconciliationStrategy, RecursiveSubmodules,
    SuppressedRetry, TagPush,
};

use super::support::{FakeExecutor, FakeReader, REJECTED_MAIN, ScriptedPrompt};

fn origin() -> Destination {
    Destination::Remote("origin".to_string())
}

fn auto_pull(strategy: ReconciliationStrategy) -> PushSettings {
    PushSettings {
        auto_pull_on_rejected: true,
        reconciliation_strategy: strategy,
        ..PushSettings::default()
    }
}

fn push_main() -> PushRequest {
    PushRequest::new(
        origin(),
        PushTarget::SingleBranch(BranchPush::new("main", "main")),
    )
}

#[tokio::test]
async fn test_preconditions_abort_before_execution() {
    let cases = [
        (
            PushRequest::new(
                Destination::Url("  ".to_string()),
                PushTarget::SingleBranch(BranchPush::new("main", "main")),
            ),
            PreconditionError::MissingDestination,
        ),
        (
            PushRequest::new(
                Destination::Remote(String::new()),
                PushTarget::SingleBranch(BranchPush::new("main", "main")),
            ),
            PreconditionError::MissingRemote,
        ),
        (
            PushRequest::new(origin(), PushTarget::Tag(TagPush::new(""))),
            PreconditionError::MissingTag,
        ),
        (
            PushRequest::new(
                origin(),
                PushTarget::SingleBranch(BranchPush::new("", "main")),
            ),
            PreconditionError::MissingBranch,
        ),
        (
            PushRequest::new(origin(), PushTarget::Matrix(BranchMatrix::default())),
            PreconditionError::EmptyMatrix,
        ),
    ];

    for (request, expected) in cases {
        let prompt = ScriptedPrompt::silent();
        let engine = PushEngine::new(
            FakeReader::on_main(),
            FakeExecutor::new(),
            &prompt,
            PushSettings::default(),
        );

        let outcome = engine.push(&request).await;

        assert_eq!(outcome, PushSequenceOutcome::Precondition(expected));
        assert!(engine.executor().pushes().is_empty());
        assert!(prompt.asked().is_empty());
    }
}

#[tokio::test]
async fn test_new_remote_branch_needs_confirmation() {
    let mut reader = FakeReader::on_main();
    reader.local_refs.push(LocalRef::new("feature"));
    let prompt = ScriptedPrompt::new([], false);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        origin(),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature")),
    );
    let outcome = engine.push(&request).await;

    assert_eq!(outcome, PushSequenceOutcome::Declined(Declined::NewBranchForRemote));
    assert_eq!(
        prompt.asked(),
        vec![PromptKind::NewBranchForRemote {
            remote: "origin".to_string(),
            remote_branch: "feature".to_string(),
        }]
    );
    assert!(engine.executor().pushes().is_empty());
}

#[tokio::test]
async fn test_default_push_mapping_is_not_new() {
    let mut reader = FakeReader::on_main();
    reader.local_refs.push(LocalRef::new("feature").tracking("origin", "feature"));
    reader.set_config("remote.origin.push", "refs/heads/feature:feature");
    let prompt = ScriptedPrompt::new([], false);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        origin(),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature")),
    );
    let outcome = engine.push(&request).await;

    assert!(outcome.succeeded());
    assert!(prompt.asked().is_empty());
}

#[tokio::test]
async fn test_tracking_cancel_aborts_without_execution() {
    let mut reader = FakeReader::on_main();
    reader.remotes = vec!["upstream".to_string()];
    reader.local_refs.push(LocalRef::new("feature"));
    reader
        .remote_refs
        .insert("upstream".to_string(), vec!["feature".to_string()]);
    let prompt = ScriptedPrompt::new([Answer::Cancel], true);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        Destination::Remote("upstream".to_string()),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature")),
    );
    let outcome = engine.push(&request).await;

    assert_eq!(outcome, PushSequenceOutcome::Declined(Declined::TrackingCancelled));
    assert_eq!(prompt.asked().len(), 1);
    assert!(engine.executor().pushes().is_empty());
}

#[tokio::test]
async fn test_tracking_yes_sets_upstream() {
    let mut reader = FakeReader::on_main();
    reader.remotes = vec!["upstream".to_string()];
    reader.local_refs.push(LocalRef::new("feature"));
    reader
        .remote_refs
        .insert("upstream".to_string(), vec!["feature".to_string()]);
    let prompt = ScriptedPrompt::new([Answer::Yes], true);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        Destination::Remote("upstream".to_string()),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature")),
    );
    let outcome = engine.push(&request).await;

    assert!(outcome.succeeded());
    let pushes = engine.executor().pushes();
    assert_eq!(
        pushes[0].to_args(),
        vec!["push", "--set-upstream", "upstream", "feature:feature"]
    );
}

#[tokio::test]
async fn test_url_push_offers_tracking() {
    let mut reader = FakeReader::on_main();
    reader.local_refs.push(LocalRef::new("feature"));
    let prompt = ScriptedPrompt::new([Answer::Yes], false);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        Destination::Url("/srv/git/mirror.git".to_string()),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature")),
    );
    let outcome = engine.push(&request).await;

    assert!(outcome.succeeded());
    // No new-branch question for URL destinations, only the tracking one
    assert_eq!(
        prompt.asked(),
        vec![PromptKind::TrackingReference {
            local: "feature".to_string(),
            remote_branch: "feature".to_string(),
        }]
    );
    assert_eq!(
        engine.executor().pushes()[0].to_args(),
        vec!["push", "--set-upstream", "/srv/git/mirror.git", "feature:feature"]
    );
}

#[tokio::test]
async fn test_push_all_offers_tracking() {
    let mut reader = FakeReader::on_main();
    reader.local_refs.push(LocalRef::new("feature"));
    let prompt = ScriptedPrompt::new([Answer::No], false);
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let request = PushRequest::new(
        origin(),
        PushTarget::SingleBranch(BranchPush::new("feature", "feature").push_all(true)),
    );
    let outcome = engine.push(&request).await;

    assert!(outcome.succeeded());
    assert_eq!(prompt.asked().len(), 1);
    assert_eq!(
        engine.executor().pushes()[0].to_args(),
        vec!["push", "--all", "origin"]
    );
}

#[tokio::test]
async fn test_rejected_active_branch_is_pulled_and_retried_once() {
    let executor = FakeExecutor::with_pushes([
        ProcessOutput::failure(REJECTED_MAIN),
        ProcessOutput::success("   4e1f0a2..9c3d7b1  main -> main"),
    ]);
    let prompt = ScriptedPrompt::silent();
    let engine = PushEngine::new(
        FakeReader::on_main(),
        executor,
        &prompt,
        auto_pull(ReconciliationStrategy::Merge),
    );

    let outcome = engine.push(&push_main()).await;

    assert!(outcome.succeeded());
    let report = outcome.report().unwrap();
    assert!(report.retried);

    let pushes = engine.executor().pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0], pushes[1]);
    assert_eq!(engine.executor().pulls().len(), 1);
    assert!(prompt.asked().is_empty());
}

#[tokio::test]
async fn test_retry_failure_is_reported() {
    let executor = FakeExecutor::with_pushes([
        ProcessOutput::failure(REJECTED_MAIN),
        ProcessOutput::failure(REJECTED_MAIN),
    ]);
    let engine = PushEngine::new(
        FakeReader::on_main(),
        executor,
        ScriptedPrompt::silent(),
        auto_pull(ReconciliationStrategy::Merge),
    );

    let outcome = engine.push(&push_main()).await;

    let report = outcome.report().unwrap();
    assert_eq!(report.state, PushState::Failed);
    assert_eq!(report.reason, Some(FailureReason::RetryFailed));
    assert_eq!(engine.executor().pushes().len(), 2);
}

#[tokio::test]
async fn test_rebase_guard_blocks_pull() {
    let reader = FakeReader {
        has_merge_commit: true,
        ..FakeReader::on_main()
    };
    let executor = FakeExecutor::with_pushes([ProcessOutput::failure(REJECTED_MAIN)]);
    let engine = PushEngine::new(
        reader,
        executor,
        ScriptedPrompt::silent(),
        auto_pull(ReconciliationStrategy::Rebase),
    );

    let outcome = engine.push(&push_main()).await;

    let report = outcome.report().unwrap();
    assert_eq!(report.state, PushState::Failed);
    assert_eq!(
        report.reason,
        Some(FailureReason::RetrySuppressed(SuppressedRetry::UnsafeRebase))
    );
    assert!(engine.executor().pulls().is_empty());
    assert_eq!(
        engine.reader().merge_queries(),
        vec![("origin/main".to_string(), "main".to_string())]
    );
}

#[tokio::test]
async fn test_submodule_mode_applies_to_branch_pushes_only() {
    let settings = PushSettings {
        recursive_submodules: RecursiveSubmodules::Check,
        ..PushSettings::default()
    };
    let engine = PushEngine::new(
        FakeReader::on_main(),
        FakeExecutor::new(),
        ScriptedPrompt::silent(),
        settings,
    );

    engine.push(&push_main()).await;
    engine
        .push(&PushRequest::new(origin(), PushTarget::Tag(TagPush::new("v1.0"))))
        .await;

    let pushes = engine.executor().pushes();
    assert!(pushes[0].to_args().contains(&"--recurse-submodules=check".to_string()));
    assert!(!pushes[1].to_args().contains(&"--recurse-submodules=check".to_string()));
}

#[tokio::test]
async fn test_reader_failure_is_reported_not_raised() {
    let reader = FakeReader {
        fail_current_branch: true,
        ..FakeReader::on_main()
    };
    let engine = PushEngine::new(
        reader,
        FakeExecutor::new(),
        ScriptedPrompt::silent(),
        PushSettings::default(),
    );

    let outcome = engine.push(&push_main()).await;

    let report = outcome.report().unwrap();
    assert_eq!(report.state, PushState::Failed);
    assert!(matches!(report.reason, Some(FailureReason::Collaborator(_))));
    assert!(engine.executor().pushes().is_empty());
}

#[tokio::test]
async fn test_matrix_push_runs_one_command() {
    let mut reader = FakeReader::on_main();
    reader.local_refs.push(LocalRef::new("wip"));
    let mut matrix = BranchMatrix::populate("origin", &reader.local_refs, &["main".to_string()]);
    let wip = matrix.position("wip").unwrap();
    matrix
        .set_flag(wip, kodegen_git_push::MatrixFlag::Push, true)
        .unwrap();
    let prompt = ScriptedPrompt::silent();
    let engine = PushEngine::new(reader, FakeExecutor::new(), &prompt, PushSettings::default());

    let outcome = engine
        .push(&PushRequest::new(origin(), PushTarget::Matrix(matrix)))
        .await;

    assert!(outcome.succeeded());
    let pushes = engine.executor().pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].to_args(), vec!["push", "origin", "main:main", "wip:wip"]);
    assert!(prompt.asked().is_empty());
}
