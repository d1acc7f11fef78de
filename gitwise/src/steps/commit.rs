use anyhow::{Result, bail};

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::{ADD, COMMIT};
use crate::io::executor::join_command;
use crate::step::{Step, StepEnv};

/// Commit the staged changes with a suggested, editable message.
pub struct CommitStep;

impl Step for CommitStep {
    fn id(&self) -> &str {
        COMMIT
    }

    fn name(&self) -> &str {
        "Commit"
    }

    fn description(&self) -> &str {
        "Commit staged changes with a suggested message"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    /// Skip when nothing was staged, including a planned add step that was
    /// skipped or failed before recording a result.
    fn should_skip(&self, ctx: &ExecutionContext) -> bool {
        match ctx.files_added() {
            Some(added) => !added,
            None => ctx.state_of(ADD).is_some(),
        }
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::FilesAdded, FactKey::DiffSummary, FactKey::ChangedFiles]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::CommitMessage, FactKey::Committed]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        if ctx.files_added().is_none() && !env.git().has_staged_changes()? {
            bail!("nothing staged to commit (stage changes first)");
        }

        let files = ctx.changed_files().unwrap_or_default();
        let suggestion = env
            .messages
            .suggest(ctx.original_input(), files, ctx.diff_summary())?;
        let message = env.prompter.ask("Commit message", Some(&suggestion))?;
        let message = message.trim();
        if message.is_empty() {
            bail!("empty commit message");
        }

        ctx.add_to_context(Fact::CommitMessage(message.to_string()))?;
        let command = join_command(&["commit", "-m", message]);
        match env.run_mutating(&command)? {
            Some(output) => {
                if let Some(first) = output.lines().next() {
                    env.prompter.show(first.trim())?;
                }
                ctx.add_to_context(Fact::Committed(true))?;
            }
            None => {
                env.prompter.show("Commit cancelled")?;
                ctx.add_to_context(Fact::Committed(false))?;
            }
        }
        Ok(())
    }
}
