//! Plan resolvers: free-text request to an ordered list of step ids.

use anyhow::Result;
use tracing::debug;

use crate::core::context::StepInfo;
use crate::core::intent::match_intent;
use crate::fallback::Fallback;
use crate::io::model::{ModelClient, parse_model_json};
use crate::io::prompt::PromptEngine;
use crate::plan::PlanProposal;

const PLAN_SCHEMA: &str = include_str!("../schemas/plan.schema.json");

pub trait PlanResolver {
    fn resolve(&self, input: &str, catalog: &[StepInfo]) -> Result<PlanProposal>;
}

impl<R: PlanResolver + ?Sized> PlanResolver for &R {
    fn resolve(&self, input: &str, catalog: &[StepInfo]) -> Result<PlanProposal> {
        (**self).resolve(input, catalog)
    }
}

/// Keyword rules over the built-in steps. Never fails; no match is an empty plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulePlanResolver;

impl RulePlanResolver {
    pub fn propose(&self, input: &str) -> PlanProposal {
        match match_intent(input) {
            Some(rule) => {
                debug!(rule = rule.name, "matched intent rule");
                PlanProposal::new(
                    rule.steps.iter().map(|id| id.to_string()).collect(),
                    rule.summary,
                )
            }
            None => {
                debug!("no intent rule matched");
                PlanProposal::empty()
            }
        }
    }
}

impl PlanResolver for RulePlanResolver {
    fn resolve(&self, input: &str, _catalog: &[StepInfo]) -> Result<PlanProposal> {
        Ok(self.propose(input))
    }
}

pub struct ModelPlanResolver<M> {
    model: M,
    prompts: PromptEngine,
}

impl<M: ModelClient> ModelPlanResolver<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompts: PromptEngine::new(),
        }
    }
}

impl<M: ModelClient> PlanResolver for ModelPlanResolver<M> {
    fn resolve(&self, input: &str, catalog: &[StepInfo]) -> Result<PlanProposal> {
        let prompt = self.prompts.render_plan(input, catalog)?;
        let reply = self.model.complete(&prompt)?;
        parse_model_json(&reply, PLAN_SCHEMA)
    }
}

impl<P: PlanResolver> PlanResolver for Fallback<P, RulePlanResolver> {
    fn resolve(&self, input: &str, catalog: &[StepInfo]) -> Result<PlanProposal> {
        Ok(self.run(
            "plan resolution",
            |model| model.resolve(input, catalog),
            |rules| rules.propose(input),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use anyhow::anyhow;

    #[test]
    fn rules_plan_commit_request() {
        let plan = RulePlanResolver
            .resolve("please commit my changes", &[])
            .expect("resolve");
        assert_eq!(
            plan.steps,
            vec!["git-status", "git-diff", "git-add", "git-commit"]
        );
        assert!(!plan.summary.is_empty());
    }

    #[test]
    fn rules_return_empty_plan_for_unrelated_text() {
        let plan = RulePlanResolver.resolve("make me a sandwich", &[]).expect("resolve");
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn model_plan_is_validated_and_parsed() {
        let model = ScriptedModel::new(vec![Ok(
            "```json\n{\"steps\": [\"git-status\"], \"summary\": \"look\"}\n```".to_string(),
        )]);
        let plan = ModelPlanResolver::new(&model)
            .resolve("anything", &[])
            .expect("resolve");
        assert_eq!(plan, PlanProposal::new(vec!["git-status".to_string()], "look"));
        assert!(model.prompts()[0].contains("anything"));
    }

    #[test]
    fn fallback_uses_rules_when_model_fails() {
        let model = ScriptedModel::new(vec![Err(anyhow!("connection refused"))]);
        let resolver = Fallback::new(Some(ModelPlanResolver::new(&model)), RulePlanResolver);
        let plan = resolver.resolve("show status", &[]).expect("resolve");
        assert_eq!(plan.steps, vec!["git-status"]);
    }

    #[test]
    fn fallback_uses_rules_when_model_reply_breaks_schema() {
        let model = ScriptedModel::new(vec![Ok("{\"steps\": \"git-status\"}".to_string())]);
        let resolver = Fallback::new(Some(ModelPlanResolver::new(&model)), RulePlanResolver);
        let plan = resolver.resolve("what's the status", &[]).expect("resolve");
        assert_eq!(plan.steps, vec!["git-status"]);
    }
}
