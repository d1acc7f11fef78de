//! Per-step state machine.
//!
//! ```text
//! Pending ──► Skipped
//!    │  └───► NotRun            (run ended before the step executed)
//!    ▼
//! Running ──► Completed
//!    ▼
//! Failed ──► FailedContinue | Aborted
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Skipped,
    Completed,
    Failed,
    FailedContinue,
    Aborted,
    NotRun,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::Completed | Self::FailedContinue | Self::Aborted | Self::NotRun
        )
    }

    /// States a visited step may end in while the run keeps going.
    pub fn is_advancing(self) -> bool {
        matches!(self, Self::Skipped | Self::Completed | Self::FailedContinue)
    }

    pub fn can_transition_to(self, next: StepState) -> bool {
        use StepState::{
            Aborted, Completed, Failed, FailedContinue, NotRun, Pending, Running, Skipped,
        };
        matches!(
            (self, next),
            (Pending, Skipped | Running | NotRun)
                | (Running, Completed | Failed)
                | (Failed, FailedContinue | Aborted)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Skipped => "skipped",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::FailedContinue => "failed (continued)",
            Self::Aborted => "aborted",
            Self::NotRun => "not run",
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub step_id: String,
    pub from: StepState,
    pub to: StepState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal state transition for step '{}': {} -> {}",
            self.step_id, self.from, self.to
        )
    }
}

impl std::error::Error for TransitionError {}
