use anyhow::Result;
use tracing::warn;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::STATUS;
use crate::step::{Step, StepEnv};

/// Inspect the working tree.
pub struct StatusStep;

impl Step for StatusStep {
    fn id(&self) -> &str {
        STATUS
    }

    fn name(&self) -> &str {
        "Status"
    }

    fn description(&self) -> &str {
        "Inspect the working tree for uncommitted changes"
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::HasChanges, FactKey::ChangedFiles, FactKey::CurrentBranch]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let git = env.git();
        let files = git.status_porcelain()?;
        let branch = match git.current_branch() {
            Ok(branch) => Some(branch),
            Err(err) => {
                warn!(err = %err, "no current branch");
                None
            }
        };

        match &branch {
            Some(branch) => env.prompter.show(&format!("On branch {branch}"))?,
            None => env.prompter.show("Not on a branch")?,
        }
        if files.is_empty() {
            env.prompter.show("Working tree clean")?;
        } else {
            env.prompter
                .show(&format!("{} changed file(s):", files.len()))?;
            for file in &files {
                env.prompter.show(&format!("  {} {}", file.code, file.path))?;
            }
        }

        ctx.add_to_context(Fact::HasChanges(!files.is_empty()))?;
        ctx.add_to_context(Fact::ChangedFiles(files))?;
        if let Some(branch) = branch {
            ctx.add_to_context(Fact::CurrentBranch(branch))?;
        }
        Ok(())
    }
}
