//! Task lifecycle state machine.
//!
//! ```text
//! Pending ──▶ Running ──┬──▶ Completed
//!                       ├──▶ Cancelled
//!                       └──▶ Failed
//! ```
//!
//! The three right-hand states are terminal.

use std::fmt;

use thiserror::Error;

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Created, not yet started.
    Pending,
    /// Stages are executing.
    Running,
    /// Every enabled stage produced a layer.
    Completed,
    /// Cancellation was observed at a checkpoint.
    Cancelled,
    /// A stage reported an error.
    Failed,
}

impl TaskState {
    /// Returns true for states no transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
                | (Self::Running, Self::Failed)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid task transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TaskState,
    pub to: TaskState,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskState; 5] = [
        TaskState::Pending,
        TaskState::Running,
        TaskState::Completed,
        TaskState::Cancelled,
        TaskState::Failed,
    ];

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_pending_only_starts() {
        for to in ALL {
            assert_eq!(
                TaskState::Pending.can_transition_to(to),
                to == TaskState::Running
            );
        }
    }

    #[test]
    fn test_running_reaches_every_terminal_state() {
        for to in ALL {
            assert_eq!(TaskState::Running.can_transition_to(to), to.is_terminal());
        }
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = InvalidTransition {
            from: TaskState::Completed,
            to: TaskState::Running,
        };
        assert_eq!(err.to_string(), "invalid task transition completed -> running");
    }
}
