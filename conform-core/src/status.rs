//! Status transition table for [`OverallStatus`].
//!
//! The graph is fully connected: every status may move to either of the other
//! two, and there is no terminal state. The table exists so the status picker
//! can offer exactly the choices that differ from the current value.

use crate::types::OverallStatus;

const TRANSITIONS: [(OverallStatus, [OverallStatus; 2]); 3] = [
    (
        OverallStatus::PreApproved,
        [OverallStatus::ReviewRequired, OverallStatus::ActionMandatory],
    ),
    (
        OverallStatus::ReviewRequired,
        [OverallStatus::PreApproved, OverallStatus::ActionMandatory],
    ),
    (
        OverallStatus::ActionMandatory,
        [OverallStatus::PreApproved, OverallStatus::ReviewRequired],
    ),
];

/// Statuses reachable from `from`, in display order.
pub fn allowed_transitions(from: OverallStatus) -> &'static [OverallStatus] {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, targets)| targets.as_slice())
        .unwrap_or(&[])
}

pub fn can_transition(from: OverallStatus, to: OverallStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Text recorded in both the history entry and the system comment.
pub fn transition_message(previous: OverallStatus, next: OverallStatus) -> String {
    format!("Status changed from {previous} to {next}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_reaches_the_other_two() {
        for from in OverallStatus::ALL {
            let targets = allowed_transitions(from);
            assert_eq!(targets.len(), 2);
            assert!(!targets.contains(&from));
            for to in OverallStatus::ALL.into_iter().filter(|s| *s != from) {
                assert!(can_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn message_uses_labels() {
        assert_eq!(
            transition_message(OverallStatus::ActionMandatory, OverallStatus::PreApproved),
            "Status changed from Action Mandatory to Pre-Approved"
        );
    }
}
