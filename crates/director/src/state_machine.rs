use aurora_core::LifecycleState;

use crate::error::{DirectorError, Result};

/// Allowed lifecycle moves of a phase instance.
///
/// Constructed -> Initializing -> Running -> Completed, and Destroyed from
/// anywhere. Nothing leaves Destroyed.
pub struct LifecycleMachine;

impl LifecycleMachine {
    pub fn validate_transition(from: &LifecycleState, to: &LifecycleState) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(DirectorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &LifecycleState) -> Vec<LifecycleState> {
        match from {
            LifecycleState::Constructed => {
                vec![LifecycleState::Initializing, LifecycleState::Destroyed]
            }
            LifecycleState::Initializing => {
                vec![LifecycleState::Running, LifecycleState::Destroyed]
            }
            LifecycleState::Running => vec![LifecycleState::Completed, LifecycleState::Destroyed],
            LifecycleState::Completed => vec![LifecycleState::Destroyed],
            LifecycleState::Destroyed => vec![],
        }
    }

    pub fn can_transition(from: &LifecycleState, to: &LifecycleState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    /// Next state on the voluntary path, ignoring teardown.
    pub fn next_state(current: &LifecycleState) -> Option<LifecycleState> {
        match current {
            LifecycleState::Constructed => Some(LifecycleState::Initializing),
            LifecycleState::Initializing => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::Completed),
            LifecycleState::Completed | LifecycleState::Destroyed => None,
        }
    }
}
