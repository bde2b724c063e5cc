//! Tests for non-fast-forward rejection detection.

use kodegen_git_push::is_rejection;

use super::support::REJECTED_MAIN;

#[test]
fn test_rejection_of_active_branch() {
    assert!(is_rejection(REJECTED_MAIN, "main"));
}

#[test]
fn test_rejection_of_other_branch() {
    let text = " ! [rejected]        develop -> develop (non-fast-forward)\n";

    assert!(!is_rejection(text, "main"));
}

#[test]
fn test_markers_split_across_lines() {
    let text = " ! [rejected]        main -> main\n (non-fast-forward)\n";

    assert!(!is_rejection(text, "main"));
}

#[test]
fn test_other_rejection_reason() {
    let text = " ! [rejected]        main -> main (fetch first)\n";

    assert!(!is_rejection(text, "main"));
}

#[test]
fn test_detached_head_never_matches() {
    assert!(!is_rejection(REJECTED_MAIN, ""));
}

#[test]
fn test_branch_name_is_literal() {
    let text = " ! [rejected]        fixa1 -> fixa1 (non-fast-forward)\n";

    assert!(!is_rejection(text, "fix.1"));
    assert!(is_rejection(
        " ! [rejected]        fix.1 -> fix.1 (non-fast-forward)\n",
        "fix.1"
    ));
}
