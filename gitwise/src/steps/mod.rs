//! Built-in git workflow steps.

pub mod add;
pub mod branch;
pub mod commit;
pub mod diff;
pub mod message;
pub mod push;
pub mod stats;
pub mod status;

use anyhow::Result;

use crate::registry::StepRegistry;
use crate::step::Step;

pub use add::AddStep;
pub use branch::{BranchListStep, BranchSwitchStep, MergeStep};
pub use commit::CommitStep;
pub use diff::DiffStep;
pub use push::PushStep;
pub use stats::CodeStatsStep;
pub use status::StatusStep;

/// Every built-in step, in listing order.
pub fn builtin_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(StatusStep),
        Box::new(DiffStep),
        Box::new(AddStep),
        Box::new(CommitStep),
        Box::new(PushStep),
        Box::new(BranchListStep),
        Box::new(BranchSwitchStep),
        Box::new(MergeStep),
        Box::new(CodeStatsStep),
    ]
}

pub fn register_builtin_steps(registry: &mut StepRegistry) -> Result<()> {
    for step in builtin_steps() {
        registry.register(step)?;
    }
    Ok(())
}

pub fn builtin_registry() -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();
    register_builtin_steps(&mut registry)?;
    Ok(registry)
}
