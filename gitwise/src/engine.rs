//! Workflow engine: plan, then drive each step through its state machine.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::context::ExecutionContext;
use crate::core::state::StepState;
use crate::core::types::{ErrorDecision, PreStepDecision, RunOutcome};
use crate::plan::{DroppedStep, FactWarning, WorkflowPlan, resolve_plan};
use crate::planner::PlanResolver;
use crate::registry::StepRegistry;
use crate::step::{Step, StepEnv};

/// Result of one `process_input` call.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub summary: String,
    pub dropped: Vec<DroppedStep>,
    pub warnings: Vec<FactWarning>,
    /// Final state of every planned step, in plan order.
    pub states: Vec<(String, StepState)>,
    /// Absent when nothing was planned.
    pub context: Option<ExecutionContext>,
}

impl RunReport {
    pub fn state_of(&self, step_id: &str) -> Option<StepState> {
        self.states
            .iter()
            .find(|(id, _)| id == step_id)
            .map(|(_, state)| *state)
    }
}

pub struct WorkflowEngine<P> {
    registry: StepRegistry,
    resolver: P,
}

impl<P: PlanResolver> WorkflowEngine<P> {
    pub fn new(registry: StepRegistry, resolver: P) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Plan `raw_input` and run the resulting workflow to a terminal outcome.
    ///
    /// Step failures are handled through the error decision and never surface
    /// as `Err`; `Err` means the engine itself could not continue (prompt I/O,
    /// an illegal state transition).
    #[instrument(skip_all, fields(input = %raw_input))]
    pub fn process_input(&self, raw_input: &str, env: &mut StepEnv<'_>) -> Result<RunReport> {
        let catalog = self.registry.catalog();
        let proposal = self.resolver.resolve(raw_input, &catalog)?;
        let plan = resolve_plan(&self.registry, proposal);

        for dropped in &plan.dropped {
            env.prompter
                .warn(&format!("ignoring {} `{}`", dropped.reason, dropped.id))?;
        }

        if plan.is_empty() {
            info!("no steps planned");
            env.prompter.show(
                "No workflow matches this request. Run `gitwise help` to see what I can do.",
            )?;
            return Ok(RunReport {
                outcome: RunOutcome::NoPlan,
                summary: plan.summary,
                dropped: plan.dropped,
                warnings: plan.warnings,
                states: Vec::new(),
                context: None,
            });
        }

        let infos = plan.steps.iter().map(|step| step.info()).collect();
        let mut ctx = ExecutionContext::new(raw_input, infos);
        show_plan(&plan, env)?;

        let outcome = drive(&plan, &mut ctx, env)?;
        info!(outcome = %outcome, "run finished");
        show_outcome(outcome, &ctx, env)?;

        let states = ctx
            .steps()
            .iter()
            .zip(ctx.states())
            .map(|(step, state)| (step.id.clone(), *state))
            .collect();
        Ok(RunReport {
            outcome,
            summary: plan.summary,
            dropped: plan.dropped,
            warnings: plan.warnings,
            states,
            context: Some(ctx),
        })
    }
}

fn drive(
    plan: &WorkflowPlan<'_>,
    ctx: &mut ExecutionContext,
    env: &mut StepEnv<'_>,
) -> Result<RunOutcome> {
    for step in &plan.steps {
        let info = step.info();
        debug!(step_id = %info.id, cursor = ctx.cursor(), "visiting step");

        if step.should_skip(ctx) {
            debug!(step_id = %info.id, "skip predicate matched");
            ctx.transition(StepState::Skipped)?;
            env.prompter.show(&format!("- {} skipped", info.name))?;
            ctx.advance();
            continue;
        }

        if step.requires_confirmation() {
            match env.prompter.confirm_step(&info)? {
                PreStepDecision::Continue => {}
                PreStepDecision::Skip => {
                    ctx.transition(StepState::Skipped)?;
                    ctx.advance();
                    continue;
                }
                PreStepDecision::Exit => {
                    info!(step_id = %info.id, "user exited before step");
                    ctx.abandon_remaining();
                    return Ok(RunOutcome::UserAborted);
                }
            }
        }

        ctx.transition(StepState::Running)?;
        let result = run_step(*step, ctx, env);
        match result {
            Ok(()) => {
                ctx.transition(StepState::Completed)?;
                ctx.advance();
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(step_id = %info.id, err = %message, "step failed");
                ctx.transition(StepState::Failed)?;
                match env.prompter.on_step_error(&info, &message)? {
                    ErrorDecision::ContinueAfterError => {
                        ctx.transition(StepState::FailedContinue)?;
                        ctx.advance();
                    }
                    ErrorDecision::ExitOnError => {
                        ctx.transition(StepState::Aborted)?;
                        ctx.abandon_remaining();
                        return Ok(RunOutcome::Aborted);
                    }
                }
            }
        }
    }
    Ok(RunOutcome::Completed)
}

/// Run one action with fact writes limited to the step's declared keys.
fn run_step(step: &dyn Step, ctx: &mut ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
    ctx.begin_step(step.id(), step.writes());
    let result = step.run(ctx, env);
    ctx.end_step();
    result
}

fn show_plan(plan: &WorkflowPlan<'_>, env: &mut StepEnv<'_>) -> Result<()> {
    if !plan.summary.is_empty() {
        env.prompter.show(&format!("Plan: {}", plan.summary))?;
    }
    for (index, step) in plan.steps.iter().enumerate() {
        let marker = if step.requires_confirmation() { " (asks first)" } else { "" };
        env.prompter
            .show(&format!("  {}. {}{marker}", index + 1, step.name()))?;
    }
    Ok(())
}

fn show_outcome(outcome: RunOutcome, ctx: &ExecutionContext, env: &mut StepEnv<'_>) -> Result<()> {
    match outcome {
        RunOutcome::Completed => env.prompter.show("Done."),
        RunOutcome::UserAborted => env.prompter.show("Stopped. Remaining steps were not run."),
        RunOutcome::Aborted => {
            let failed = ctx.current().map(|step| step.name.as_str()).unwrap_or("a step");
            env.prompter.show(&format!(
                "Stopped after {failed} failed. Fix the problem and run the request again."
            ))
        }
        RunOutcome::NoPlan => Ok(()),
    }
}
