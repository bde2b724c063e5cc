//! Tests for the multi-branch push matrix.

use kodegen_git_push::{BranchMatrix, LocalRef, MatrixFlag, MatrixRow};
use proptest::prelude::*;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn sample_matrix() -> BranchMatrix {
    BranchMatrix::populate(
        "origin",
        &[LocalRef::new("A"), LocalRef::new("B")],
        &names(&["A", "C"]),
    )
}

#[test]
fn test_populate_local_and_remote_rows() {
    let matrix = sample_matrix();
    let rows = matrix.rows();

    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].local.as_deref(), Some("A"));
    assert_eq!(rows[0].remote, "A");
    assert!(rows[0].push());
    assert!(!rows[0].is_new_on_remote);

    assert_eq!(rows[1].local.as_deref(), Some("B"));
    assert_eq!(rows[1].remote, "B");
    assert!(!rows[1].push());
    assert!(rows[1].is_new_on_remote);

    assert_eq!(rows[2].local, None);
    assert_eq!(rows[2].remote, "C");
    assert!(!rows[2].push());
    assert!(!rows[2].force());
    assert!(!rows[2].delete());
}

#[test]
fn test_populate_uses_merge_target_of_tracked_remote() {
    let locals = [
        LocalRef::new("feature").tracking("origin", "feature-v2"),
        LocalRef::new("fix").tracking("upstream", "hotfix"),
    ];
    let matrix = BranchMatrix::populate("origin", &locals, &names(&["feature-v2"]));
    let rows = matrix.rows();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].remote, "feature-v2");
    assert!(rows[0].push());
    // Tracks another remote, so keeps its own name
    assert_eq!(rows[1].remote, "fix");
    assert!(rows[1].is_new_on_remote);
}

#[test]
fn test_populate_does_not_duplicate_consumed_remote_refs() {
    let locals = [LocalRef::new("topic").tracking("origin", "shared")];
    let matrix = BranchMatrix::populate("origin", &locals, &names(&["shared", "shared", "other"]));

    let remotes: Vec<&str> = matrix.rows().iter().map(|r| r.remote.as_str()).collect();
    assert_eq!(remotes, vec!["shared", "other"]);
}

#[test]
fn test_set_flag_clears_siblings() {
    let mut matrix = sample_matrix();

    matrix.set_flag(0, MatrixFlag::Force, true).unwrap();
    assert!(matrix.rows()[0].force());
    assert!(!matrix.rows()[0].push());

    matrix.set_flag(0, MatrixFlag::Delete, true).unwrap();
    assert!(matrix.rows()[0].delete());
    assert!(!matrix.rows()[0].force());

    matrix.set_flag(0, MatrixFlag::Push, true).unwrap();
    assert!(matrix.rows()[0].push());
    assert!(!matrix.rows()[0].delete());
}

#[test]
fn test_clearing_a_flag_leaves_others_alone() {
    let mut matrix = sample_matrix();
    matrix.set_flag(0, MatrixFlag::Force, true).unwrap();

    matrix.set_flag(0, MatrixFlag::Delete, false).unwrap();
    assert!(matrix.rows()[0].force());

    matrix.set_flag(0, MatrixFlag::Force, false).unwrap();
    assert!(!matrix.rows()[0].get(MatrixFlag::Force));
    assert!(!matrix.rows()[0].get(MatrixFlag::Push));
}

#[test]
fn test_set_flag_rejects_bad_rows() {
    let mut matrix = sample_matrix();

    assert!(matrix.set_flag(9, MatrixFlag::Push, true).is_err());
    // Remote-only rows can only be deleted
    assert!(matrix.set_flag(2, MatrixFlag::Push, true).is_err());
    assert!(matrix.set_flag(2, MatrixFlag::Force, true).is_err());
    assert!(!matrix.rows()[2].push());

    matrix.set_flag(2, MatrixFlag::Delete, true).unwrap();
    assert!(matrix.rows()[2].delete());
}

#[test]
fn test_build_actions_in_row_order() {
    let mut matrix = sample_matrix();
    matrix.set_flag(1, MatrixFlag::Force, true).unwrap();
    matrix.set_flag(2, MatrixFlag::Delete, true).unwrap();

    let refspecs: Vec<String> = matrix.build_actions().iter().map(|a| a.refspec()).collect();
    assert_eq!(refspecs, vec!["A:A", "+B:B", ":C"]);
}

#[test]
fn test_build_actions_skips_unselected_rows() {
    let mut matrix = sample_matrix();
    matrix.set_flag(0, MatrixFlag::Push, false).unwrap();

    assert!(matrix.build_actions().is_empty());
}

#[test]
fn test_position_by_local_then_remote_name() {
    let matrix = BranchMatrix::new(vec![
        MatrixRow::new(Some("work".to_string()), "main", false),
        MatrixRow::new(None, "work-old", false),
    ]);

    assert_eq!(matrix.position("work"), Some(0));
    assert_eq!(matrix.position("main"), Some(0));
    assert_eq!(matrix.position("work-old"), Some(1));
    assert_eq!(matrix.position("missing"), None);
}

fn any_flag() -> impl Strategy<Value = MatrixFlag> {
    prop_oneof![
        Just(MatrixFlag::Push),
        Just(MatrixFlag::Force),
        Just(MatrixFlag::Delete),
    ]
}

proptest! {
    #[test]
    fn test_at_most_one_flag_per_row(
        ops in prop::collection::vec((0usize..4, any_flag(), any::<bool>()), 0..64)
    ) {
        let mut matrix = sample_matrix();

        for (row, flag, value) in ops {
            let accepted = matrix.set_flag(row, flag, value).is_ok();

            for r in matrix.rows() {
                let set = [r.push(), r.force(), r.delete()].iter().filter(|v| **v).count();
                prop_assert!(set <= 1);
            }
            if accepted && value {
                prop_assert!(matrix.rows()[row].get(flag));
            }
        }
    }
}
