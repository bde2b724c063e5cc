//! Non-fast-forward rejection detection

use regex::Regex;

const REJECTED_MARKER: &str = "! [rejected] ";
const NON_FAST_FORWARD_MARKER: &str = " (non-fast-forward)";

/// Whether `captured_text` reports a non-fast-forward rejection of
/// `active_branch`.
///
/// The marker, branch name and reason must share one line. Rejections of
/// other branches (e.g. from a matrix push) do not count, and neither does
/// anything when no branch is checked out.
pub fn is_rejection(captured_text: &str, active_branch: &str) -> bool {
    if active_branch.is_empty() {
        return false;
    }

    let pattern = format!(
        "{}.*{}.*{}",
        regex::escape(REJECTED_MARKER),
        regex::escape(active_branch),
        regex::escape(NON_FAST_FORWARD_MARKER),
    );

    // `.` does not match `\n` unless the `s` flag is set
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(captured_text),
        Err(_) => false,
    }
}
