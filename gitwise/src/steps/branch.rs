//! Branch listing, switching and merging.

use anyhow::{Result, bail};
use tracing::warn;

use crate::core::context::ExecutionContext;
use crate::core::facts::{Fact, FactKey};
use crate::core::step_ids::{BRANCH_LIST, BRANCH_SWITCH, MERGE};
use crate::io::executor::join_command;
use crate::step::{Step, StepEnv};

const NEW_BRANCH: &str = "Create a new branch";

pub struct BranchListStep;

impl Step for BranchListStep {
    fn id(&self) -> &str {
        BRANCH_LIST
    }

    fn name(&self) -> &str {
        "List branches"
    }

    fn description(&self) -> &str {
        "List local branches and mark the current one"
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::Branches, FactKey::CurrentBranch]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let git = env.git();
        let branches = git.local_branches()?;
        let current = git
            .current_branch()
            .inspect_err(|err| warn!(err = %err, "no current branch"))
            .ok();

        for branch in &branches {
            let marker = if current.as_deref() == Some(branch.as_str()) { "*" } else { " " };
            env.prompter.show(&format!("{marker} {branch}"))?;
        }

        ctx.add_to_context(Fact::Branches(branches))?;
        if let Some(current) = current {
            ctx.add_to_context(Fact::CurrentBranch(current))?;
        }
        Ok(())
    }
}

/// Check out an existing branch or create a new one.
pub struct BranchSwitchStep;

impl Step for BranchSwitchStep {
    fn id(&self) -> &str {
        BRANCH_SWITCH
    }

    fn name(&self) -> &str {
        "Switch branch"
    }

    fn description(&self) -> &str {
        "Switch to another branch or create a new one"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::Branches]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::SelectedBranch, FactKey::CurrentBranch]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let branches = match ctx.branches() {
            Some(branches) => branches.to_vec(),
            None => env.git().local_branches()?,
        };
        let current = ctx.current_branch().map(str::to_string);

        let mut options: Vec<String> = branches
            .into_iter()
            .filter(|branch| Some(branch) != current.as_ref())
            .collect();
        options.push(NEW_BRANCH.to_string());

        let Some(index) = env.prompter.choose("Switch to which branch?", &options)? else {
            env.prompter.show("No branch selected")?;
            return Ok(());
        };

        let (target, command) = if options[index] == NEW_BRANCH {
            let name = env.prompter.ask("New branch name", None)?;
            let name = validate_branch_name(&name)?;
            if env.git().branch_exists(&name)? {
                bail!("branch {name} already exists");
            }
            let command = join_command(&["checkout", "-b", name.as_str()]);
            (name, command)
        } else {
            let name = options[index].clone();
            let command = join_command(&["checkout", name.as_str()]);
            (name, command)
        };

        if env.run_mutating(&command)?.is_none() {
            env.prompter.show("Branch switch cancelled")?;
            return Ok(());
        }
        env.prompter.show(&format!("Switched to {target}"))?;
        ctx.add_to_context(Fact::SelectedBranch(target.clone()))?;
        ctx.add_to_context(Fact::CurrentBranch(target))?;
        Ok(())
    }
}

/// Merge another local branch into the current one.
pub struct MergeStep;

impl Step for MergeStep {
    fn id(&self) -> &str {
        MERGE
    }

    fn name(&self) -> &str {
        "Merge branch"
    }

    fn description(&self) -> &str {
        "Merge another branch into the current branch"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn reads(&self) -> &[FactKey] {
        &[FactKey::Branches, FactKey::CurrentBranch]
    }

    fn writes(&self) -> &[FactKey] {
        &[FactKey::MergedBranch]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
        let git = env.git();
        let current = match ctx.current_branch() {
            Some(branch) => branch.to_string(),
            None => git.current_branch()?,
        };
        let branches = match ctx.branches() {
            Some(branches) => branches.to_vec(),
            None => git.local_branches()?,
        };
        let candidates: Vec<String> = branches
            .into_iter()
            .filter(|branch| *branch != current)
            .collect();
        if candidates.is_empty() {
            bail!("no other local branch to merge into {current}");
        }

        let question = format!("Merge which branch into {current}?");
        let Some(index) = env.prompter.choose(&question, &candidates)? else {
            env.prompter.show("No branch selected")?;
            return Ok(());
        };
        let source = candidates[index].clone();

        let command = join_command(&["merge", source.as_str()]);
        if env.run_mutating(&command)?.is_none() {
            env.prompter.show("Merge cancelled")?;
            return Ok(());
        }
        env.prompter.show(&format!("Merged {source} into {current}"))?;
        ctx.add_to_context(Fact::MergedBranch(source))?;
        Ok(())
    }
}

fn validate_branch_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("branch name must be non-empty");
    }
    if name.starts_with('-') || name.chars().any(char::is_whitespace) || name.contains("..") {
        bail!("invalid branch name: {name}");
    }
    Ok(name.to_string())
}
