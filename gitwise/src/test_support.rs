//! Test-only doubles: scripted executor, prompter and model, a configurable
//! step, and a throwaway git repository.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use crate::core::context::{ExecutionContext, StepInfo};
use crate::core::facts::{Fact, FactKey};
use crate::core::types::{ErrorDecision, PreStepDecision};
use crate::gate::{RiskGate, generate_code};
use crate::io::config::StepsConfig;
use crate::io::executor::{CommandExecutor, CommandResult};
use crate::io::model::ModelClient;
use crate::io::terminal::Prompter;
use crate::plan::PlanProposal;
use crate::planner::PlanResolver;
use crate::risk::LocalRiskClassifier;
use crate::step::{Step, StepEnv};
use crate::steps::message::RuleCommitMessages;

/// Seed of the harness risk gate.
pub const GATE_SEED: u64 = 7;
pub const CODE_LEN: usize = 6;

/// First challenge code the harness gate will ask for.
pub fn first_challenge_code() -> String {
    generate_code(&mut StdRng::seed_from_u64(GATE_SEED), CODE_LEN)
}

/// Executor answering from a table; unknown commands succeed with no output.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    responses: HashMap<String, CommandResult>,
    calls: RefCell<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, result: CommandResult) -> Self {
        self.responses.insert(command.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.calls.borrow().iter().any(|call| call == command)
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        self.calls.borrow_mut().push(command.to_string());
        Ok(self
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandResult::ok("")))
    }
}

/// One scripted answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Text(String),
    Choice(Option<usize>),
    Step(PreStepDecision),
    OnError(ErrorDecision),
}

/// Prompter that replays answers in order and records everything shown.
///
/// Asking for a different kind of answer than the next scripted one, or
/// running out of answers, is an error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    shown: Vec<String>,
    warnings: Vec<String>,
    step_errors: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            ..Self::default()
        }
    }

    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn step_errors(&self) -> &[String] {
        &self.step_errors
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, wanted: &str) -> Result<Answer> {
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer left for {wanted}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&mut self, message: &str) -> Result<()> {
        self.shown.push(message.to_string());
        Ok(())
    }

    fn warn(&mut self, message: &str) -> Result<()> {
        self.warnings.push(message.to_string());
        Ok(())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.next("confirm")? {
            Answer::Confirm(value) => Ok(value),
            other => bail!("expected Confirm for {question:?}, scripted {other:?}"),
        }
    }

    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        match self.next("ask")? {
            Answer::Text(text) if text.trim().is_empty() => {
                Ok(default.unwrap_or_default().to_string())
            }
            Answer::Text(text) => Ok(text.trim().to_string()),
            other => bail!("expected Text for {question:?}, scripted {other:?}"),
        }
    }

    fn choose(&mut self, question: &str, options: &[String]) -> Result<Option<usize>> {
        match self.next("choose")? {
            Answer::Choice(Some(index)) if index >= options.len() => {
                bail!("scripted choice {index} out of range for {question:?}")
            }
            Answer::Choice(choice) => Ok(choice),
            other => bail!("expected Choice for {question:?}, scripted {other:?}"),
        }
    }

    fn confirm_step(&mut self, step: &StepInfo) -> Result<PreStepDecision> {
        match self.next("confirm_step")? {
            Answer::Step(decision) => Ok(decision),
            other => bail!("expected Step decision for {}, scripted {other:?}", step.id),
        }
    }

    fn on_step_error(&mut self, step: &StepInfo, error: &str) -> Result<ErrorDecision> {
        self.step_errors.push(error.to_string());
        match self.next("on_step_error")? {
            Answer::OnError(decision) => Ok(decision),
            other => bail!("expected OnError decision for {}, scripted {other:?}", step.id),
        }
    }
}

/// Model replaying canned replies and recording prompts.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: RefCell<VecDeque<Result<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl ModelClient for ScriptedModel {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted model reply left")))
    }
}

/// Resolver that always proposes the same ids.
#[derive(Debug, Clone)]
pub struct FixedPlan(pub PlanProposal);

impl FixedPlan {
    pub fn of(ids: &[&str]) -> Self {
        Self(PlanProposal::new(
            ids.iter().map(|id| id.to_string()).collect(),
            "fixed plan",
        ))
    }
}

impl PlanResolver for FixedPlan {
    fn resolve(&self, _input: &str, _catalog: &[StepInfo]) -> Result<PlanProposal> {
        Ok(self.0.clone())
    }
}

/// Shared log of step ids in the order their actions ran.
pub type RunLog = Rc<RefCell<Vec<String>>>;

/// Configurable step for engine and registry tests.
#[derive(Debug, Clone)]
pub struct TestStep {
    id: String,
    name: String,
    confirm: bool,
    skip: bool,
    reads: Vec<FactKey>,
    writes: Vec<FactKey>,
    publish: Vec<Fact>,
    failure: Option<String>,
    log: Option<RunLog>,
}

impl TestStep {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: format!("{id} step"),
            confirm: false,
            skip: false,
            reads: Vec::new(),
            writes: Vec::new(),
            publish: Vec::new(),
            failure: None,
            log: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn confirming(mut self) -> Self {
        self.confirm = true;
        self
    }

    pub fn skipping(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn reading(mut self, keys: &[FactKey]) -> Self {
        self.reads = keys.to_vec();
        self
    }

    pub fn writing(mut self, keys: &[FactKey]) -> Self {
        self.writes = keys.to_vec();
        self
    }

    /// Publish `fact` when run. Does not declare it; pair with [`writing`](Self::writing).
    pub fn publishing(mut self, fact: Fact) -> Self {
        self.publish.push(fact);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn logging(mut self, log: &RunLog) -> Self {
        self.log = Some(Rc::clone(log));
        self
    }
}

impl Step for TestStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "test step"
    }

    fn requires_confirmation(&self) -> bool {
        self.confirm
    }

    fn should_skip(&self, _ctx: &ExecutionContext) -> bool {
        self.skip
    }

    fn reads(&self) -> &[FactKey] {
        &self.reads
    }

    fn writes(&self) -> &[FactKey] {
        &self.writes
    }

    fn run(&self, ctx: &mut ExecutionContext, _env: &mut StepEnv<'_>) -> Result<()> {
        if let Some(log) = &self.log {
            log.borrow_mut().push(self.id.clone());
        }
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        for fact in &self.publish {
            ctx.add_to_context(fact.clone())?;
        }
        Ok(())
    }
}

/// Owns everything a [`StepEnv`] borrows.
pub struct Harness {
    pub executor: FakeExecutor,
    pub prompter: ScriptedPrompter,
    pub gate: RiskGate,
    pub messages: RuleCommitMessages,
    pub settings: StepsConfig,
}

impl Harness {
    pub fn new(executor: FakeExecutor, answers: Vec<Answer>) -> Self {
        Self {
            executor,
            prompter: ScriptedPrompter::new(answers),
            gate: RiskGate::with_seed(Box::new(LocalRiskClassifier), CODE_LEN, GATE_SEED),
            messages: RuleCommitMessages,
            settings: StepsConfig::default(),
        }
    }

    pub fn env(&mut self) -> StepEnv<'_> {
        StepEnv {
            executor: &self.executor,
            prompter: &mut self.prompter,
            gate: &mut self.gate,
            messages: &self.messages,
            settings: &self.settings,
        }
    }
}

/// Context for running a single step outside the engine.
pub fn context_for(step: &dyn Step, input: &str) -> ExecutionContext {
    ExecutionContext::new(input, vec![step.info()])
}

/// Run `step` the way the engine does: writes limited to its declared keys.
pub fn run_scoped(step: &dyn Step, ctx: &mut ExecutionContext, harness: &mut Harness) -> Result<()> {
    ctx.begin_step(step.id(), step.writes());
    let result = step.run(ctx, &mut harness.env());
    ctx.end_step();
    result
}

/// Temporary git repository on branch `main` with one commit.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "user.name", "test"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.write("README.md", "hi\n")?;
        repo.git(&["add", "README.md"])?;
        repo.git(&["commit", "--quiet", "-m", "chore: init"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Run git in the repository and return stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
