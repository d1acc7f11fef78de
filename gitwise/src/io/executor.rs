//! Executor abstraction for git command text.
//!
//! The [`CommandExecutor`] trait decouples steps from how git is actually run.
//! Tests use scripted executors that answer from a table without spawning
//! processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::io::config::GitConfig;
use crate::io::process::run_command_with_timeout;

/// Result of one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Turn an unsuccessful result into an error naming `command`.
    pub fn into_checked(self, command: &str) -> Result<String> {
        if self.success {
            return Ok(self.output);
        }
        let detail = self
            .error
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("no error output");
        Err(anyhow!("git {command} failed: {detail}"))
    }
}

/// Runs git command text such as `"commit -m 'msg'"`.
///
/// A non-zero exit is reported through [`CommandResult::success`]; `Err` is
/// reserved for failures to run the command at all.
pub trait CommandExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult>;
}

/// Executor that spawns the configured git program in a working directory.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    program: String,
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl GitExecutor {
    pub fn new(workdir: impl Into<PathBuf>, config: &GitConfig) -> Self {
        Self {
            program: config.program.clone(),
            workdir: workdir.into(),
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        }
    }
}

impl CommandExecutor for GitExecutor {
    #[instrument(skip_all, fields(command = %command, workdir = %self.workdir.display()))]
    fn execute(&self, command: &str) -> Result<CommandResult> {
        let args = split_command(command)?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&args).current_dir(&self.workdir);

        let output = run_command_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run git {command}"))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "git command timed out");
            return Ok(CommandResult::failed(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            )));
        }
        if !output.success() {
            debug!(exit_code = ?output.status.code(), "git command failed");
            let stderr = output.stderr_text();
            let error = if stderr.trim().is_empty() {
                format!("exit status {:?}", output.status.code())
            } else {
                stderr.trim().to_string()
            };
            return Ok(CommandResult {
                success: false,
                output: output.stdout_text(),
                error: Some(error),
            });
        }
        Ok(CommandResult::ok(output.stdout_text()))
    }
}

/// Split command text into argv, dropping a leading `git`.
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let mut args =
        shell_words::split(command).with_context(|| format!("parse command: {command}"))?;
    if args.first().map(String::as_str) == Some("git") {
        args.remove(0);
    }
    if args.is_empty() {
        return Err(anyhow!("empty git command"));
    }
    Ok(args)
}

/// Build command text from arguments, quoting where needed.
pub fn join_command<S: AsRef<str>>(args: &[S]) -> String {
    shell_words::join(args.iter().map(AsRef::as_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_git_prefix_and_honors_quotes() {
        let args = split_command("git commit -m 'fix: a b'").expect("split");
        assert_eq!(args, vec!["commit", "-m", "fix: a b"]);
    }

    #[test]
    fn split_rejects_empty_command() {
        assert!(split_command("git").is_err());
        assert!(split_command("   ").is_err());
    }

    #[test]
    fn join_quotes_arguments_with_spaces() {
        let text = join_command(&["commit", "-m", "two words"]);
        assert_eq!(split_command(&text).expect("split"), vec!["commit", "-m", "two words"]);
    }

    #[test]
    fn checked_failure_mentions_command() {
        let err = CommandResult::failed("fatal: not a git repository")
            .into_checked("status")
            .unwrap_err();
        assert!(err.to_string().contains("git status failed"));
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn executor_runs_in_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = GitExecutor::new(temp.path(), &GitConfig::default());
        let result = executor.execute("status").expect("execute");
        assert!(!result.success);
        assert!(result.error.expect("error").contains("not a git repository"));
    }
}
