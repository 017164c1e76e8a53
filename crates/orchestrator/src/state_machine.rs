use bpa_core::TaskState;

use crate::error::{OrchestratorError, Result};

/// Task lifecycle: OPEN moves to exactly one terminal state, terminal
/// states never move again.
pub struct TaskStateMachine;

impl TaskStateMachine {
    pub fn validate_transition(from: &TaskState, to: &TaskState) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &TaskState) -> Vec<TaskState> {
        match from {
            TaskState::Open => vec![TaskState::Completed, TaskState::Declined, TaskState::Deleted],
            TaskState::Completed | TaskState::Declined | TaskState::Deleted => vec![],
        }
    }

    pub fn can_transition(from: &TaskState, to: &TaskState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn is_terminal(state: &TaskState) -> bool {
        Self::allowed_transitions(state).is_empty()
    }
}
