//! Wiring for one CLI invocation: config in, engine and services out.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use crate::core::context::StepInfo;
use crate::engine::{RunReport, WorkflowEngine};
use crate::fallback::Fallback;
use crate::gate::RiskGate;
use crate::io::config::GitwiseConfig;
use crate::io::executor::GitExecutor;
use crate::io::git::Git;
use crate::io::model::CommandModelClient;
use crate::io::terminal::Prompter;
use crate::planner::{ModelPlanResolver, RulePlanResolver};
use crate::risk::{LocalRiskClassifier, ModelRiskClassifier};
use crate::step::StepEnv;
use crate::steps::builtin_registry;
use crate::steps::message::{ModelCommitMessages, RuleCommitMessages};

type Resolver = Fallback<ModelPlanResolver<CommandModelClient>, RulePlanResolver>;

/// Engine plus the services its steps need, built from one config.
pub struct Session {
    engine: WorkflowEngine<Resolver>,
    executor: GitExecutor,
    gate: RiskGate,
    messages: Fallback<ModelCommitMessages<CommandModelClient>, RuleCommitMessages>,
    config: GitwiseConfig,
}

impl Session {
    /// Build a session for `repo`. `env` looks up environment variables.
    pub fn new<F>(config: GitwiseConfig, repo: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let executor = GitExecutor::new(repo, &config.git);
        if !Git::new(&executor).is_work_tree()? {
            bail!("{} is not inside a git work tree", repo.display());
        }

        let model = CommandModelClient::from_config(&config.model, env);
        info!(model = model.is_some(), "session ready");

        let resolver = Fallback::new(model.clone().map(ModelPlanResolver::new), RulePlanResolver);
        let classifier = Fallback::new(
            model.clone().map(ModelRiskClassifier::new),
            LocalRiskClassifier,
        );
        let messages = Fallback::new(model.map(ModelCommitMessages::new), RuleCommitMessages);

        Ok(Self {
            engine: WorkflowEngine::new(builtin_registry()?, resolver),
            executor,
            gate: RiskGate::new(Box::new(classifier), config.confirm.challenge_code_len),
            messages,
            config,
        })
    }

    pub fn run(&mut self, request: &str, prompter: &mut dyn Prompter) -> Result<RunReport> {
        let mut env = StepEnv {
            executor: &self.executor,
            prompter,
            gate: &mut self.gate,
            messages: &self.messages,
            settings: &self.config.steps,
        };
        self.engine.process_input(request, &mut env)
    }
}

/// Text of `gitwise help`.
pub fn render_help(catalog: &[StepInfo]) -> String {
    let width = catalog.iter().map(|step| step.id.len()).max().unwrap_or(0);
    let mut out = String::from("Describe what you want in plain words, e.g. `gitwise commit and push my work`.\n\nSteps:\n");
    for step in catalog {
        let marker = if step.requires_confirmation { " (asks first)" } else { "" };
        out.push_str(&format!(
            "  {:<width$}  {}: {}{marker}\n",
            step.id, step.name, step.description
        ));
    }
    out.push_str(
        "\nBefore a step that asks first:\n  \
         c, continue, Enter  run the step\n  \
         s, skip             skip it and go on\n  \
         e, exit, q          stop; later steps are not run\n\
         \nAfter a step fails:\n  \
         c, continue         go on with the next step\n  \
         e, exit, Enter      stop the workflow\n\
         \nHigh-risk commands also ask you to retype a numeric code.\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;

    #[test]
    fn help_lists_steps_and_vocabulary() {
        let catalog = builtin_registry().expect("registry").catalog();
        let help = render_help(&catalog);
        assert!(help.contains("git-status"));
        assert!(help.contains("Push the current branch to its remote (asks first)"));
        assert!(help.contains("s, skip"));
        assert!(help.contains("e, exit, Enter"));
    }

    #[test]
    fn session_requires_a_work_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = Session::new(GitwiseConfig::default(), temp.path(), |_| None)
            .err()
            .expect("not a repo");
        assert!(err.to_string().contains("not inside a git work tree"));
    }

    #[test]
    fn session_builds_in_repo() {
        let repo = TestRepo::new().expect("repo");
        assert!(Session::new(GitwiseConfig::default(), repo.path(), |_| None).is_ok());
    }
}
