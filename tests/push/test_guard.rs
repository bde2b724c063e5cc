//! Tests for the retry context snapshot and rebase-safety guard.

use kodegen_git_push::{
    BranchPush, Destination, PushTarget, ReconciliationStrategy, RetryContext, TagPush,
    is_unsafe_to_auto_rebase,
};

use super::support::FakeReader;

fn main_target() -> PushTarget {
    PushTarget::SingleBranch(BranchPush::new("main", "main"))
}

fn origin() -> Destination {
    Destination::Remote("origin".to_string())
}

fn snapshot(target: &PushTarget, destination: &Destination, strategy: ReconciliationStrategy) -> RetryContext {
    RetryContext::snapshot(
        target,
        destination,
        strategy,
        Some("main".to_string()),
        Some("origin".to_string()),
    )
}

#[test]
fn test_candidate_only_for_plain_branch_rebase_to_remote() {
    let rebase = ReconciliationStrategy::Rebase;

    assert!(snapshot(&main_target(), &origin(), rebase).candidate_for_rebase_retry);
    assert!(!snapshot(&main_target(), &origin(), ReconciliationStrategy::Merge).candidate_for_rebase_retry);
    assert!(
        !snapshot(&main_target(), &Destination::Url("/tmp/x.git".into()), rebase)
            .candidate_for_rebase_retry
    );

    let all = PushTarget::SingleBranch(BranchPush::new("main", "main").push_all(true));
    assert!(!snapshot(&all, &origin(), rebase).candidate_for_rebase_retry);

    let tag = PushTarget::Tag(TagPush::new("v1"));
    assert!(!snapshot(&tag, &origin(), rebase).candidate_for_rebase_retry);
}

#[test]
fn test_snapshot_captures_selection() {
    let target = PushTarget::SingleBranch(BranchPush::new(" main ", " release "));
    let ctx = snapshot(&target, &origin(), ReconciliationStrategy::Rebase);

    assert_eq!(ctx.pushed_branch, "main");
    assert_eq!(ctx.selected_remote_branch, "release");
    assert_eq!(ctx.pushed_remote, "origin");
    assert!(ctx.pushed_active_branch_to_its_remote());
}

#[tokio::test]
async fn test_merge_commit_makes_rebase_unsafe() {
    let reader = FakeReader {
        has_merge_commit: true,
        ..FakeReader::on_main()
    };
    let ctx = snapshot(&main_target(), &origin(), ReconciliationStrategy::Rebase);

    assert!(is_unsafe_to_auto_rebase(&ctx, &reader).await.unwrap());
    assert_eq!(
        reader.merge_queries(),
        vec![("origin/main".to_string(), "main".to_string())]
    );
}

#[tokio::test]
async fn test_linear_history_is_safe() {
    let reader = FakeReader::on_main();
    let ctx = snapshot(&main_target(), &origin(), ReconciliationStrategy::Rebase);

    assert!(!is_unsafe_to_auto_rebase(&ctx, &reader).await.unwrap());
}

#[tokio::test]
async fn test_other_branch_or_remote_skips_history_check() {
    let reader = FakeReader {
        has_merge_commit: true,
        ..FakeReader::on_main()
    };

    let other_branch = PushTarget::SingleBranch(BranchPush::new("feature", "feature"));
    let ctx = snapshot(&other_branch, &origin(), ReconciliationStrategy::Rebase);
    assert!(!is_unsafe_to_auto_rebase(&ctx, &reader).await.unwrap());

    let ctx = snapshot(
        &main_target(),
        &Destination::Remote("fork".to_string()),
        ReconciliationStrategy::Rebase,
    );
    assert!(!is_unsafe_to_auto_rebase(&ctx, &reader).await.unwrap());

    let ctx = snapshot(&main_target(), &origin(), ReconciliationStrategy::Merge);
    assert!(!is_unsafe_to_auto_rebase(&ctx, &reader).await.unwrap());

    assert!(reader.merge_queries().is_empty());
}
