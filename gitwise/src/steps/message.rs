//! Commit message suggestions.

use anyhow::Result;
use serde::Deserialize;

use crate::core::facts::{ChangedFile, DiffSummary};
use crate::fallback::Fallback;
use crate::io::model::{ModelClient, parse_model_json};
use crate::io::prompt::PromptEngine;

const COMMIT_MESSAGE_SCHEMA: &str = include_str!("../../schemas/commit_message.schema.json");

pub trait CommitMessageSource {
    fn suggest(
        &self,
        request: &str,
        files: &[ChangedFile],
        diff: Option<DiffSummary>,
    ) -> Result<String>;
}

/// Summarizes the changed paths. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCommitMessages;

impl RuleCommitMessages {
    pub fn summarize(&self, files: &[ChangedFile]) -> String {
        match files {
            [] => "Update files".to_string(),
            [file] => format!("{} {}", verb(file), file.path),
            [first, second] => {
                let verb = shared_verb(files).unwrap_or("Update");
                format!("{verb} {} and {}", first.path, second.path)
            }
            _ => {
                let verb = shared_verb(files).unwrap_or("Update");
                format!("{verb} {} files", files.len())
            }
        }
    }
}

fn verb(file: &ChangedFile) -> &'static str {
    if file.is_untracked() || file.code.contains('A') {
        "Add"
    } else if file.code.contains('D') {
        "Remove"
    } else if file.code.contains('R') {
        "Rename"
    } else {
        "Update"
    }
}

fn shared_verb(files: &[ChangedFile]) -> Option<&'static str> {
    let first = verb(files.first()?);
    files.iter().all(|file| verb(file) == first).then_some(first)
}

impl CommitMessageSource for RuleCommitMessages {
    fn suggest(&self, _request: &str, files: &[ChangedFile], _diff: Option<DiffSummary>) -> Result<String> {
        Ok(self.summarize(files))
    }
}

#[derive(Debug, Deserialize)]
struct CommitMessageReply {
    message: String,
}

pub struct ModelCommitMessages<M> {
    model: M,
    prompts: PromptEngine,
}

impl<M: ModelClient> ModelCommitMessages<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompts: PromptEngine::new(),
        }
    }
}

impl<M: ModelClient> CommitMessageSource for ModelCommitMessages<M> {
    fn suggest(
        &self,
        request: &str,
        files: &[ChangedFile],
        diff: Option<DiffSummary>,
    ) -> Result<String> {
        let prompt = self.prompts.render_commit_message(request, files, diff)?;
        let reply = self.model.complete(&prompt)?;
        let parsed: CommitMessageReply = parse_model_json(&reply, COMMIT_MESSAGE_SCHEMA)?;
        Ok(parsed.message.trim().to_string())
    }
}

impl<P: CommitMessageSource> CommitMessageSource for Fallback<P, RuleCommitMessages> {
    fn suggest(
        &self,
        request: &str,
        files: &[ChangedFile],
        diff: Option<DiffSummary>,
    ) -> Result<String> {
        Ok(self.run(
            "commit message",
            |model| model.suggest(request, files, diff),
            |rules| rules.summarize(files),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use anyhow::anyhow;

    fn file(code: &str, path: &str) -> ChangedFile {
        ChangedFile {
            code: code.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn single_file_messages_name_the_file() {
        let rules = RuleCommitMessages;
        assert_eq!(rules.summarize(&[file(" M", "a.ts")]), "Update a.ts");
        assert_eq!(rules.summarize(&[file("??", "new.rs")]), "Add new.rs");
        assert_eq!(rules.summarize(&[file(" D", "old.rs")]), "Remove old.rs");
    }

    #[test]
    fn many_files_are_counted() {
        let rules = RuleCommitMessages;
        let files = vec![file(" M", "a"), file("??", "b"), file(" M", "c")];
        assert_eq!(rules.summarize(&files), "Update 3 files");
        let added = vec![file("??", "a"), file("A ", "b")];
        assert_eq!(rules.summarize(&added), "Add a and b");
    }

    #[test]
    fn model_message_is_trimmed() {
        let model = ScriptedModel::new(vec![Ok("{\"message\": \"  Fix parser \"}".to_string())]);
        let message = ModelCommitMessages::new(&model)
            .suggest("commit", &[file(" M", "a")], None)
            .expect("suggest");
        assert_eq!(message, "Fix parser");
    }

    #[test]
    fn fallback_summarizes_when_model_fails() {
        let model = ScriptedModel::new(vec![Err(anyhow!("timeout"))]);
        let source = Fallback::new(Some(ModelCommitMessages::new(&model)), RuleCommitMessages);
        let message = source
            .suggest("commit", &[file(" M", "a.ts")], None)
            .expect("suggest");
        assert_eq!(message, "Update a.ts");
    }
}
