//! Stable exit codes for the gitwise CLI.

use crate::core::types::RunOutcome;

/// Workflow completed, or the user chose to exit before a step.
pub const OK: i32 = 0;
/// Invalid config, I/O failure or invalid CLI use.
pub const INVALID: i32 = 1;
/// The user stopped the workflow after a step failed.
pub const ABORTED: i32 = 2;
/// No step could be planned from the request.
pub const NO_PLAN: i32 = 3;

pub fn for_outcome(outcome: RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Completed | RunOutcome::UserAborted => OK,
        RunOutcome::Aborted => ABORTED,
        RunOutcome::NoPlan => NO_PLAN,
    }
}
