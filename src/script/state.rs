use serde::{Deserialize, Serialize};

/// Lifecycle of a single execution.
///
/// `Rejected`, `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionState {
    Idle,
    Validating,
    Rejected,
    Running,
    Completed,
    Failed,
}

impl Default for ExecutionState {
    fn default() -> Self {
        ExecutionState::Idle
    }
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Rejected | ExecutionState::Completed | ExecutionState::Failed
        )
    }

    /// Transitions the state machine permits.
    pub fn can_advance_to(&self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Running)
                | (Running, Completed)
                | (Running, Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionState::*;

    #[test]
    fn only_forward_edges_are_allowed() {
        assert!(Idle.can_advance_to(Validating));
        assert!(Validating.can_advance_to(Rejected));
        assert!(Running.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Running));
        assert!(!Completed.can_advance_to(Running));
        assert!(!Rejected.can_advance_to(Running));
    }

    #[test]
    fn terminal_states() {
        for state in [Rejected, Completed, Failed] {
            assert!(state.is_terminal());
        }
        for state in [Idle, Validating, Running] {
            assert!(!state.is_terminal());
        }
    }
}
