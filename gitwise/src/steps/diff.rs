use anyhow::Result;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::DIFF;
use crate::step::{Step, StepEnv};

/// Measure the pending diff.
pub struct DiffStep;

impl Step for DiffStep {
    fn id(&self) -> &str {
        DIFF
    }

    fn name(&self) -> &str {
        "Diff analysis"
    }

    fn description(&self) -> &str {
        "Summarize the size of staged and unstaged changes"
    }

    fn should_skip(&self, ctx: &ExecutionContext) -> bool {
        ctx.has_changes() == Some(false)
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::HasChanges]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::DiffSummary]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let summary = env.git().diff_summary()?;
        let untracked = ctx
            .changed_files()
            .map(|files| files.iter().filter(|file| file.is_untracked()).count())
            .unwrap_or(0);

        env.prompter.show(&format!(
            "{} file(s) changed, +{} -{}",
            summary.files_changed, summary.insertions, summary.deletions
        ))?;
        if untracked > 0 {
            env.prompter
                .show(&format!("{untracked} untracked file(s) not counted in the diff"))?;
        }

        ctx.add_to_context(Fact::DiffSummary(summary))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::facts::{ChangedFile, DiffSummary};
    use crate::io::executor::CommandResult;
    use crate::test_support::{FakeExecutor, Harness, context_for, run_scoped};

    #[test]
    fn skipped_when_tree_is_clean() {
        let mut ctx = context_for(&DiffStep, "diff");
        assert!(!DiffStep.should_skip(&ctx));
        ctx.add_to_context(Fact::HasChanges(false)).expect("add");
        assert!(DiffStep.should_skip(&ctx));
    }

    #[test]
    fn records_combined_summary() {
        let executor = FakeExecutor::new()
            .respond(
                "diff --shortstat",
                CommandResult::ok(" 1 file changed, 3 insertions(+), 1 deletion(-)\n"),
            )
            .respond(
                "diff --cached --shortstat",
                CommandResult::ok(" 1 file changed, 2 insertions(+)\n"),
            );
        let mut harness = Harness::new(executor, vec![]);
        let mut ctx = context_for(&DiffStep, "review");
        ctx.add_to_context(Fact::ChangedFiles(vec![ChangedFile {
            code: "??".to_string(),
            path: "new.rs".to_string(),
        }]))
        .expect("add");

        run_scoped(&DiffStep, &mut ctx, &mut harness).expect("run");

        assert_eq!(
            ctx.diff_summary(),
            Some(DiffSummary {
                files_changed: 2,
                insertions: 5,
                deletions: 1,
            })
        );
        assert!(
            harness
                .prompter
                .shown()
                .iter()
                .any(|line| line.contains("1 untracked file(s)"))
        );
    }
}
