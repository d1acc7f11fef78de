use anyhow::Result;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::CODE_STATS;
use crate::step::{Step, StepEnv};

/// Commit and line counts over the configured period.
pub struct CodeStatsStep;

impl Step for CodeStatsStep {
    fn id(&self) -> &str {
        CODE_STATS
    }

    fn name(&self) -> &str {
        "Code statistics"
    }

    fn description(&self) -> &str {
        "Summarize recent commits and changed lines"
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::CodeStats]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let since = env.settings.stats_since.clone();
        let stats = env.git().code_stats(&since)?;

        env.prompter.show(&format!(
            "Since {since}: {} commit(s), {} file(s), +{} -{}",
            stats.commits, stats.files_changed, stats.insertions, stats.deletions
        ))?;
        for (path, lines) in &stats.top_files {
            env.prompter.show(&format!("  {lines:>6}  {path}"))?;
        }

        ctx.add_to_context(Fact::CodeStats(stats))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::numstat_log_args;
    use crate::io::executor::{CommandResult, join_command};
    use crate::test_support::{FakeExecutor, Harness, context_for, run_scoped};

    #[test]
    fn records_stats_for_configured_period() {
        let command = join_command(&numstat_log_args("1 week ago"));
        let executor = FakeExecutor::new().respond(
            &command,
            CommandResult::ok("@@commit\n\n4\t1\tsrc/lib.rs\n"),
        );
        let mut harness = Harness::new(executor, vec![]);
        let mut ctx = context_for(&CodeStatsStep, "stats");

        run_scoped(&CodeStatsStep, &mut ctx, &mut harness).expect("run");

        let stats = ctx.code_stats().expect("stats");
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.insertions, 4);
        assert_eq!(stats.top_files, vec![("src/lib.rs".to_string(), 5)]);
        assert!(harness.prompter.shown()[0].starts_with("Since 1 week ago: 1 commit(s)"));
    }

    #[test]
    fn empty_history_is_all_zero() {
        let mut harness = Harness::new(FakeExecutor::new(), vec![]);
        let mut ctx = context_for(&CodeStatsStep, "stats");
        run_scoped(&CodeStatsStep, &mut ctx, &mut harness).expect("run");
        assert_eq!(ctx.code_stats().map(|s| s.commits), Some(0));
    }
}
