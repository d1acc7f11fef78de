//! Read-only git queries on top of a [`CommandExecutor`].
//!
//! State-changing commands never go through this wrapper: steps send them
//! through the risk gate instead.

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::facts::{ChangedFile, CodeStats, DiffSummary};
use crate::core::stats::{numstat_log_args, parse_numstat_log, parse_shortstat};
use crate::core::status::{parse_branch_list, parse_porcelain};
use crate::io::executor::{CommandExecutor, join_command};

/// Status query used for [`Git::status_porcelain`].
pub const STATUS_COMMAND: &str = "status --porcelain=v1 -uall -z";

/// Thin query layer over an executor.
pub struct Git<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> Git<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// True when the executor's working directory is inside a work tree.
    pub fn is_work_tree(&self) -> Result<bool> {
        let result = self.executor.execute("rev-parse --is-inside-work-tree")?;
        Ok(result.success && result.output.trim() == "true")
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run_checked("rev-parse --abbrev-ref HEAD")?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD (check out a branch first)"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// Status entries, untracked files included.
    pub fn status_porcelain(&self) -> Result<Vec<ChangedFile>> {
        let out = self.run_checked(STATUS_COMMAND)?;
        parse_porcelain(&out)
    }

    /// Local branch names.
    pub fn local_branches(&self) -> Result<Vec<String>> {
        let out = self.run_checked("branch --format=%(refname:short)")?;
        Ok(parse_branch_list(&out))
    }

    /// Check whether a local branch exists.
    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        let command = join_command(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{branch}"),
        ]);
        Ok(self.executor.execute(&command)?.success)
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_checked("diff --cached --name-only")?;
        Ok(!out.trim().is_empty())
    }

    /// Upstream of the current branch, if one is configured.
    pub fn upstream(&self) -> Result<Option<String>> {
        let result = self
            .executor
            .execute("rev-parse --abbrev-ref --symbolic-full-name @{u}")?;
        if !result.success {
            return Ok(None);
        }
        let name = result.output.trim().to_string();
        Ok((!name.is_empty()).then_some(name))
    }

    /// Combined staged + unstaged diff size against the index and HEAD.
    pub fn diff_summary(&self) -> Result<DiffSummary> {
        let unstaged = parse_shortstat(&self.run_checked("diff --shortstat")?);
        let staged = parse_shortstat(&self.run_checked("diff --cached --shortstat")?);
        Ok(unstaged.merge(staged))
    }

    /// Commit statistics since `since` (any `git log --since` value).
    pub fn code_stats(&self, since: &str) -> Result<CodeStats> {
        let out = self.run_checked(&join_command(&numstat_log_args(since)))?;
        Ok(parse_numstat_log(&out))
    }

    fn run_checked(&self, command: &str) -> Result<String> {
        self.executor.execute(command)?.into_checked(command)
    }
}
