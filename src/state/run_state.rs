/// Run lifecycle states of the orchestrator
use std::fmt;

/// Lifecycle of a crawl run
///
/// `Idle → Running → {Completed, Aborted}`. `Idle` may also go straight to
/// `Aborted` when setup fails before the first cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Constructed, no cell processed yet
    Idle,

    /// Walking the plan
    Running,

    // ===== Terminal States =====
    /// Target reached, plan exhausted, or stopped between cells
    Completed,

    /// Setup failed; no page was processed
    Aborted,
}

impl RunState {
    /// Returns true if no transition may leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Aborted)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Aborted.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(RunState::Idle.can_transition_to(RunState::Running));
        assert!(RunState::Idle.can_transition_to(RunState::Aborted));
        assert!(RunState::Running.can_transition_to(RunState::Completed));
        assert!(RunState::Running.can_transition_to(RunState::Aborted));

        assert!(!RunState::Idle.can_transition_to(RunState::Completed));
        assert!(!RunState::Running.can_transition_to(RunState::Idle));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [RunState::Completed, RunState::Aborted] {
            for next in [
                RunState::Idle,
                RunState::Running,
                RunState::Completed,
                RunState::Aborted,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RunState::Running.to_string(), "running");
        assert_eq!(format!("{}", RunState::Aborted), "aborted");
    }
}
