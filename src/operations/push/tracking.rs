//! Tracking-reference decision for single-branch pushes

use log::debug;

use super::prompt::{Answer, DecisionPrompt, PromptKind};
use crate::operations::repository::LocalRef;

/// Whether the push should set the branch's upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingDecision {
    Set,
    DoNotSet,
    /// The user cancelled; the push must not run.
    Cancel,
}

/// Decide whether pushing `local` to `remote_text` should set its upstream.
///
/// An explicit request always wins. Otherwise tracking is only offered for a
/// known local branch without a tracking remote, and never when
/// `remote_text` already starts with a known remote name (it looks like an
/// explicit remote-qualified destination). An offer goes through a
/// yes/no/cancel prompt.
pub fn resolve_tracking<P: DecisionPrompt>(
    local: Option<&LocalRef>,
    remote_text: &str,
    explicit_set_tracking: bool,
    known_remotes: &[String],
    prompt: &P,
) -> TrackingDecision {
    if explicit_set_tracking {
        return TrackingDecision::Set;
    }

    let remote_text = remote_text.trim();
    let Some(local) = local else {
        return TrackingDecision::DoNotSet;
    };

    let mut track = !remote_text.is_empty() && !local.has_tracking_remote();
    if known_remotes
        .iter()
        .any(|remote| !remote.is_empty() && remote_text.starts_with(remote.as_str()))
    {
        track = false;
    }

    if !track {
        return TrackingDecision::DoNotSet;
    }

    let kind = PromptKind::TrackingReference {
        local: local.name.clone(),
        remote_branch: remote_text.to_string(),
    };
    let decision = match prompt.ask(&kind) {
        Answer::Yes => TrackingDecision::Set,
        Answer::No => TrackingDecision::DoNotSet,
        Answer::Cancel => TrackingDecision::Cancel,
    };
    debug!("tracking decision for `{}`: {decision:?}", local.name);
    decision
}
