use anyhow::Result;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::ADD;
use crate::step::{Step, StepEnv};

const ADD_ALL: &str = "add -A";

/// Stage every change, untracked files included.
pub struct AddStep;

impl Step for AddStep {
    fn id(&self) -> &str {
        ADD
    }

    fn name(&self) -> &str {
        "Stage changes"
    }

    fn description(&self) -> &str {
        "Stage all modified and untracked files"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn should_skip(&self, ctx: &ExecutionContext) -> bool {
        ctx.has_changes() == Some(false)
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::HasChanges, FactKey::ChangedFiles]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::FilesAdded]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        if let Some(files) = ctx.changed_files() {
            for file in files {
                env.prompter.show(&format!("  {} {}", file.code, file.path))?;
            }
        }

        if env.run_mutating(ADD_ALL)?.is_none() {
            env.prompter.show("Nothing staged")?;
            ctx.add_to_context(Fact::FilesAdded(false))?;
            return Ok(());
        }

        let staged = env.git().has_staged_changes()?;
        if !staged {
            env.prompter.show("No changes to stage")?;
        }
        ctx.add_to_context(Fact::FilesAdded(staged))?;
        Ok(())
    }
}
