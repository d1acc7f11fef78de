//! Turning a proposed list of step ids into concrete steps.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::facts::FactKey;
use crate::registry::StepRegistry;
use crate::step::Step;

/// Planner answer before resolution against the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProposal {
    pub steps: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl PlanProposal {
    pub fn new(steps: Vec<String>, summary: impl Into<String>) -> Self {
        Self {
            steps,
            summary: summary.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropReason {
    Unknown,
    Duplicate,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DropReason::Unknown => "unknown step",
            DropReason::Duplicate => "duplicate step",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedStep {
    pub id: String,
    pub reason: DropReason,
}

/// A reads-before-writes gap in the plan. Not fatal: the reading step sees an
/// absent fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactWarning {
    pub step_id: String,
    pub key: FactKey,
}

impl fmt::Display for FactWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} reads {} but no earlier step writes it",
            self.step_id, self.key
        )
    }
}

pub struct WorkflowPlan<'r> {
    pub steps: Vec<&'r dyn Step>,
    pub summary: String,
    pub dropped: Vec<DroppedStep>,
    pub warnings: Vec<FactWarning>,
}

impl WorkflowPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.id()).collect()
    }
}

/// Resolve proposed ids in order. Unknown and repeated ids are dropped, the
/// first occurrence is kept.
pub fn resolve_plan<'r>(registry: &'r StepRegistry, proposal: PlanProposal) -> WorkflowPlan<'r> {
    let mut steps: Vec<&dyn Step> = Vec::new();
    let mut dropped = Vec::new();
    let mut seen = HashSet::new();

    for raw in proposal.steps {
        let id = raw.trim();
        let Some(step) = registry.lookup(id) else {
            warn!(step_id = %id, "dropping unknown step");
            dropped.push(DroppedStep {
                id: id.to_string(),
                reason: DropReason::Unknown,
            });
            continue;
        };
        if !seen.insert(id.to_string()) {
            warn!(step_id = %id, "dropping duplicate step");
            dropped.push(DroppedStep {
                id: id.to_string(),
                reason: DropReason::Duplicate,
            });
            continue;
        }
        steps.push(step);
    }

    let warnings = fact_warnings(&steps);
    for warning in &warnings {
        warn!(step_id = %warning.step_id, key = %warning.key, "fact read before any write");
    }

    WorkflowPlan {
        steps,
        summary: proposal.summary.trim().to_string(),
        dropped,
        warnings,
    }
}

fn fact_warnings(steps: &[&dyn Step]) -> Vec<FactWarning> {
    let mut written: HashSet<FactKey> = HashSet::new();
    let mut warnings = Vec::new();
    for step in steps {
        for key in step.reads() {
            if !written.contains(key) {
                warnings.push(FactWarning {
                    step_id: step.id().to_string(),
                    key: *key,
                });
            }
        }
        written.extend(step.writes().iter().copied());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestStep;

    fn registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        for step in [
            TestStep::new("git-status").writing(&[FactKey::HasChanges]),
            TestStep::new("git-add")
                .reading(&[FactKey::HasChanges])
                .writing(&[FactKey::FilesAdded]),
            TestStep::new("git-commit").reading(&[FactKey::FilesAdded]),
        ] {
            registry.register(Box::new(step)).expect("register");
        }
        registry
    }

    fn ids(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_id_is_dropped() {
        let registry = registry();
        let plan = resolve_plan(
            &registry,
            PlanProposal::new(ids(&["git-status", "git-nonexistent"]), "check"),
        );
        assert_eq!(plan.step_ids(), vec!["git-status"]);
        assert_eq!(
            plan.dropped,
            vec![DroppedStep {
                id: "git-nonexistent".to_string(),
                reason: DropReason::Unknown,
            }]
        );
    }

    #[test]
    fn sole_unknown_id_gives_empty_plan() {
        let registry = registry();
        let plan = resolve_plan(&registry, PlanProposal::new(ids(&["git-nonexistent"]), ""));
        assert!(plan.is_empty());
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let registry = registry();
        let plan = resolve_plan(
            &registry,
            PlanProposal::new(ids(&["git-status", "git-add", "git-status"]), ""),
        );
        assert_eq!(plan.step_ids(), vec!["git-status", "git-add"]);
        assert_eq!(plan.dropped[0].reason, DropReason::Duplicate);
    }

    #[test]
    fn reads_without_earlier_writer_are_warned() {
        let registry = registry();
        let plan = resolve_plan(
            &registry,
            PlanProposal::new(ids(&["git-add", "git-commit"]), ""),
        );
        assert_eq!(
            plan.warnings,
            vec![FactWarning {
                step_id: "git-add".to_string(),
                key: FactKey::HasChanges,
            }]
        );

        let full = resolve_plan(
            &registry,
            PlanProposal::new(ids(&["git-status", "git-add", "git-commit"]), ""),
        );
        assert!(full.warnings.is_empty());
    }
}
