//! Prompt rendering for model calls.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::context::StepInfo;
use crate::core::facts::{ChangedFile, DiffSummary};

const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const RISK_TEMPLATE: &str = include_str!("prompts/risk.md");
const COMMIT_MESSAGE_TEMPLATE: &str = include_str!("prompts/commit_message.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("plan", PLAN_TEMPLATE)
            .expect("plan template should be valid");
        env.add_template("risk", RISK_TEMPLATE)
            .expect("risk template should be valid");
        env.add_template("commit_message", COMMIT_MESSAGE_TEMPLATE)
            .expect("commit message template should be valid");
        Self { env }
    }

    pub fn render_plan(&self, request: &str, steps: &[StepInfo]) -> Result<String> {
        let template = self.env.get_template("plan")?;
        Ok(template.render(context! {
            request => request.trim(),
            steps => steps,
        })?)
    }

    pub fn render_risk(&self, command: &str) -> Result<String> {
        let template = self.env.get_template("risk")?;
        Ok(template.render(context! { command => command.trim() })?)
    }

    pub fn render_commit_message(
        &self,
        request: &str,
        files: &[ChangedFile],
        diff: Option<DiffSummary>,
    ) -> Result<String> {
        let template = self.env.get_template("commit_message")?;
        Ok(template.render(context! {
            request => request.trim(),
            files => files,
            diff => diff,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_prompt_lists_every_step() {
        let steps = vec![
            StepInfo {
                id: "git-status".to_string(),
                name: "Status".to_string(),
                description: "Inspect the working tree".to_string(),
                requires_confirmation: false,
            },
            StepInfo {
                id: "git-push".to_string(),
                name: "Push".to_string(),
                description: "Publish commits".to_string(),
                requires_confirmation: true,
            },
        ];
        let prompt = PromptEngine::new()
            .render_plan("  push my work ", &steps)
            .expect("render");
        assert!(prompt.contains("push my work"));
        assert!(prompt.contains("`git-status` (Status)"));
        assert!(prompt.contains("`git-push` (Push): Publish commits [asks for confirmation]"));
    }

    #[test]
    fn risk_prompt_embeds_command() {
        let prompt = PromptEngine::new().render_risk("push --force").expect("render");
        assert!(prompt.contains("git push --force"));
    }

    #[test]
    fn commit_prompt_omits_size_without_diff() {
        let files = vec![ChangedFile {
            code: " M".to_string(),
            path: "a.ts".to_string(),
        }];
        let engine = PromptEngine::new();
        let without = engine
            .render_commit_message("commit", &files, None)
            .expect("render");
        assert!(without.contains("a.ts"));
        assert!(!without.contains("## Size"));

        let with = engine
            .render_commit_message(
                "commit",
                &files,
                Some(DiffSummary {
                    files_changed: 1,
                    insertions: 4,
                    deletions: 0,
                }),
            )
            .expect("render");
        assert!(with.contains("1 files changed, 4 insertions"));
    }
}
