use anyhow::{Result, anyhow};
use tracing::debug;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::{COMMIT, PUSH};
use crate::io::executor::join_command;
use crate::step::{Step, StepEnv};

/// Push the current branch, setting an upstream on first push.
pub struct PushStep;

impl Step for PushStep {
    fn id(&self) -> &str {
        PUSH
    }

    fn name(&self) -> &str {
        "Push"
    }

    fn description(&self) -> &str {
        "Push the current branch to its remote"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    /// Skip when nothing was committed, including a planned commit step
    /// that was skipped or failed before recording a result.
    fn should_skip(&self, ctx: &ExecutionContext) -> bool {
        match ctx.committed() {
            Some(committed) => !committed,
            None => ctx.state_of(COMMIT).is_some(),
        }
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::Committed, FactKey::CurrentBranch]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::Pushed]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let git = env.git();
        let branch = match ctx.current_branch() {
            Some(branch) => branch.to_string(),
            None => git
                .current_branch()
                .map_err(|err| anyhow!("cannot push: {err}"))?,
        };

        let command = match git.upstream()? {
            Some(upstream) => {
                debug!(%upstream, "pushing to configured upstream");
                "push".to_string()
            }
            None => join_command(&["push", "-u", env.settings.remote.as_str(), branch.as_str()]),
        };

        let pushed = env.run_mutating(&command)?.is_some();
        if pushed {
            env.prompter.show(&format!("Pushed {branch}"))?;
        } else {
            env.prompter.show("Push cancelled")?;
        }
        ctx.add_to_context(Fact::Pushed(pushed))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::executor::CommandResult;
    use crate::test_support::{Answer, FakeExecutor, Harness, context_for, run_scoped};

    const UPSTREAM: &str = "rev-parse --abbrev-ref --symbolic-full-name @{u}";

    fn on_branch(name: &str) -> ExecutionContext {
        let mut ctx = context_for(&PushStep, "push");
        ctx.add_to_context(Fact::CurrentBranch(name.to_string()))
            .expect("add");
        ctx
    }

    #[test]
    fn first_push_sets_upstream() {
        let executor =
            FakeExecutor::new().respond(UPSTREAM, CommandResult::failed("no upstream configured"));
        let mut harness = Harness::new(executor, vec![Answer::Confirm(true)]);
        let mut ctx = on_branch("feature/x");

        run_scoped(&PushStep, &mut ctx, &mut harness).expect("run");

        assert_eq!(ctx.pushed(), Some(true));
        assert!(harness.executor.was_called("push -u origin feature/x"));
        assert!(harness.prompter.warnings()[0].starts_with("medium risk"));
    }

    #[test]
    fn existing_upstream_uses_plain_push() {
        let executor =
            FakeExecutor::new().respond(UPSTREAM, CommandResult::ok("origin/main\n"));
        let mut harness = Harness::new(executor, vec![Answer::Confirm(true)]);
        let mut ctx = on_branch("main");

        run_scoped(&PushStep, &mut ctx, &mut harness).expect("run");

        assert!(harness.executor.was_called("push"));
    }

    #[test]
    fn rejected_push_is_an_error() {
        let executor = FakeExecutor::new()
            .respond(UPSTREAM, CommandResult::ok("origin/main\n"))
            .respond("push", CommandResult::failed("! [rejected] main -> main (fetch first)"));
        let mut harness = Harness::new(executor, vec![Answer::Confirm(true)]);
        let mut ctx = on_branch("main");

        let err = run_scoped(&PushStep, &mut ctx, &mut harness).unwrap_err();
        assert!(err.to_string().contains("rejected"));
        assert_eq!(ctx.pushed(), None);
    }

    #[test]
    fn skipped_when_nothing_was_committed() {
        let mut ctx = context_for(&PushStep, "push");
        assert!(!PushStep.should_skip(&ctx));
        ctx.add_to_context(Fact::Committed(false)).expect("add");
        assert!(PushStep.should_skip(&ctx));
    }

    #[test]
    fn skipped_when_planned_commit_recorded_nothing() {
        let ctx = ExecutionContext::new(
            "push",
            vec![crate::steps::CommitStep.info(), PushStep.info()],
        );
        assert!(PushStep.should_skip(&ctx));
    }
}
