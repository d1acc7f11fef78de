//! The step contract and the environment a step runs in.

use anyhow::Result;
use tracing::debug;

use crate::core::context::{ExecutionContext, StepInfo};
use crate::core::facts::FactKey;
use crate::gate::{GateVerdict, RiskGate};
use crate::io::config::StepsConfig;
use crate::io::executor::CommandExecutor;
use crate::io::git::Git;
use crate::io::terminal::Prompter;
use crate::steps::message::CommitMessageSource;

/// One named unit of work in a workflow.
///
/// Steps are registered once and shared by every run. They read facts left by
/// earlier steps and publish their own through the [`ExecutionContext`]; only
/// the keys returned by [`writes`](Step::writes) are accepted while the step
/// runs.
pub trait Step {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Ask Continue / Skip / Exit before running.
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Skip without asking. Never skips unless overridden.
    fn should_skip(&self, _ctx: &ExecutionContext) -> bool {
        false
    }

    fn reads(&self) -> &[FactKey] {
        &[]
    }

    fn writes(&self) -> &[FactKey] {
        &[]
    }

    fn run(&self, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()>;

    fn info(&self) -> StepInfo {
        StepInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            requires_confirmation: self.requires_confirmation(),
        }
    }
}

/// Services available to a running step.
pub struct StepEnv<'a> {
    pub executor: &'a dyn CommandExecutor,
    pub prompter: &'a mut dyn Prompter,
    pub gate: &'a mut RiskGate,
    pub messages: &'a dyn CommitMessageSource,
    pub settings: &'a StepsConfig,
}

impl<'a> StepEnv<'a> {
    pub fn git(&self) -> Git<'a> {
        Git::new(self.executor)
    }

    /// Run a read-only command; a non-zero exit is an error.
    pub fn run_read(&self, command: &str) -> Result<String> {
        self.executor.execute(command)?.into_checked(command)
    }

    /// Run a state-changing command after the risk gate approves it.
    ///
    /// `Ok(None)` when the user declined; a failed command is an error.
    pub fn run_mutating(&mut self, command: &str) -> Result<Option<String>> {
        match self.gate.review(&mut *self.prompter, command)? {
            GateVerdict::Declined => {
                debug!(command, "declined at risk gate");
                Ok(None)
            }
            GateVerdict::Approved => {
                let output = self.executor.execute(command)?.into_checked(command)?;
                Ok(Some(output))
            }
        }
    }
}
