//! Execution context threaded through one workflow run.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::facts::{ChangedFile, CodeStats, DiffSummary, Fact, FactKey, UndeclaredFactError};
use crate::core::state::{StepState, TransitionError};

/// Descriptive view of a registered step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requires_confirmation: bool,
}

/// Write scope of the step currently executing.
#[derive(Debug, Clone)]
struct WriteScope {
    step_id: String,
    allowed: Vec<FactKey>,
}

/// State of one run: the request, the resolved steps, the cursor, per-step
/// states and the facts published so far.
///
/// The cursor only moves forward. Facts follow last-write-wins.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    original_input: String,
    steps: Vec<StepInfo>,
    cursor: usize,
    states: Vec<StepState>,
    facts: BTreeMap<FactKey, Fact>,
    #[serde(skip)]
    scope: Option<WriteScope>,
}

impl ExecutionContext {
    pub fn new(original_input: impl Into<String>, steps: Vec<StepInfo>) -> Self {
        let states = vec![StepState::Pending; steps.len()];
        Self {
            original_input: original_input.into(),
            steps,
            cursor: 0,
            states,
            facts: BTreeMap::new(),
            scope: None,
        }
    }

    pub fn original_input(&self) -> &str {
        &self.original_input
    }

    pub fn steps(&self) -> &[StepInfo] {
        &self.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Step under the cursor, `None` once every step was visited.
    pub fn current(&self) -> Option<&StepInfo> {
        self.steps.get(self.cursor)
    }

    pub fn states(&self) -> &[StepState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<StepState> {
        self.states.get(index).copied()
    }

    pub fn state_of(&self, step_id: &str) -> Option<StepState> {
        self.steps
            .iter()
            .position(|step| step.id == step_id)
            .and_then(|index| self.state(index))
    }

    /// Move the step under the cursor to `next`.
    pub fn transition(&mut self, next: StepState) -> Result<(), TransitionError> {
        let index = self.cursor;
        let (Some(step), Some(current)) = (self.steps.get(index), self.states.get(index).copied())
        else {
            return Err(TransitionError {
                step_id: format!("#{index}"),
                from: StepState::NotRun,
                to: next,
            });
        };
        if !current.can_transition_to(next) {
            return Err(TransitionError {
                step_id: step.id.clone(),
                from: current,
                to: next,
            });
        }
        self.states[index] = next;
        Ok(())
    }

    /// Advance past a step that reached an advancing terminal state.
    pub fn advance(&mut self) {
        if self.cursor < self.steps.len() {
            self.cursor += 1;
        }
    }

    /// Mark every still-pending step `NotRun`. The cursor stays where the run stopped.
    pub fn abandon_remaining(&mut self) {
        for state in self.states.iter_mut().skip(self.cursor) {
            if *state == StepState::Pending {
                *state = StepState::NotRun;
            }
        }
    }

    /// Restrict fact writes to `allowed` until [`end_step`](Self::end_step).
    pub fn begin_step(&mut self, step_id: &str, allowed: &[FactKey]) {
        self.scope = Some(WriteScope {
            step_id: step_id.to_string(),
            allowed: allowed.to_vec(),
        });
    }

    pub fn end_step(&mut self) {
        self.scope = None;
    }

    /// Publish a fact, replacing any earlier fact with the same key.
    ///
    /// Returns the replaced fact. While a step is executing, only keys declared
    /// by that step are accepted.
    pub fn add_to_context(&mut self, fact: Fact) -> Result<Option<Fact>, UndeclaredFactError> {
        let key = fact.key();
        if let Some(scope) = &self.scope {
            if !scope.allowed.contains(&key) {
                return Err(UndeclaredFactError {
                    step_id: scope.step_id.clone(),
                    key,
                });
            }
        }
        Ok(self.facts.insert(key, fact))
    }

    pub fn get_from_context(&self, key: FactKey) -> Option<&Fact> {
        self.facts.get(&key)
    }

    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }

    pub fn has_changes(&self) -> Option<bool> {
        match self.get_from_context(FactKey::HasChanges) {
            Some(Fact::HasChanges(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn changed_files(&self) -> Option<&[ChangedFile]> {
        match self.get_from_context(FactKey::ChangedFiles) {
            Some(Fact::ChangedFiles(files)) => Some(files),
            _ => None,
        }
    }

    pub fn current_branch(&self) -> Option<&str> {
        match self.get_from_context(FactKey::CurrentBranch) {
            Some(Fact::CurrentBranch(name)) => Some(name),
            _ => None,
        }
    }

    pub fn diff_summary(&self) -> Option<DiffSummary> {
        match self.get_from_context(FactKey::DiffSummary) {
            Some(Fact::DiffSummary(summary)) => Some(*summary),
            _ => None,
        }
    }

    pub fn files_added(&self) -> Option<bool> {
        match self.get_from_context(FactKey::FilesAdded) {
            Some(Fact::FilesAdded(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn commit_message(&self) -> Option<&str> {
        match self.get_from_context(FactKey::CommitMessage) {
            Some(Fact::CommitMessage(message)) => Some(message),
            _ => None,
        }
    }

    pub fn committed(&self) -> Option<bool> {
        match self.get_from_context(FactKey::Committed) {
            Some(Fact::Committed(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn pushed(&self) -> Option<bool> {
        match self.get_from_context(FactKey::Pushed) {
            Some(Fact::Pushed(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn branches(&self) -> Option<&[String]> {
        match self.get_from_context(FactKey::Branches) {
            Some(Fact::Branches(branches)) => Some(branches),
            _ => None,
        }
    }

    pub fn selected_branch(&self) -> Option<&str> {
        match self.get_from_context(FactKey::SelectedBranch) {
            Some(Fact::SelectedBranch(name)) => Some(name),
            _ => None,
        }
    }

    pub fn merged_branch(&self) -> Option<&str> {
        match self.get_from_context(FactKey::MergedBranch) {
            Some(Fact::MergedBranch(name)) => Some(name),
            _ => None,
        }
    }

    pub fn code_stats(&self) -> Option<&CodeStats> {
        match self.get_from_context(FactKey::CodeStats) {
            Some(Fact::CodeStats(stats)) => Some(stats),
            _ => None,
        }
    }
}
