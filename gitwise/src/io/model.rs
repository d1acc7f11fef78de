//! Model client used by the planner, the risk classifier and commit messages.
//!
//! The model is any command that reads a prompt on stdin and answers on
//! stdout. Keeping it a subprocess lets users plug in a local model, a cloud
//! CLI, or a caching wrapper without `gitwise` holding API credentials.

use std::process::Command;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::io::config::ModelConfig;
use crate::io::process::run_command_with_timeout;

/// Text completion backend.
pub trait ModelClient {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<M: ModelClient + ?Sized> ModelClient for &M {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// Model client that spawns the configured command.
#[derive(Debug, Clone)]
pub struct CommandModelClient {
    config: ModelConfig,
}

impl CommandModelClient {
    /// Build a client if the model is usable: a command is configured and the
    /// API key variable, when one is named, is present in `env`.
    pub fn from_config<F>(config: &ModelConfig, env: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if config.command.is_empty() {
            debug!("no model command configured");
            return None;
        }
        let key_env = config.api_key_env.trim();
        if !key_env.is_empty() && env(key_env).is_none_or(|value| value.trim().is_empty()) {
            warn!(api_key_env = key_env, "model API key not set, model disabled");
            return None;
        }
        Some(Self {
            config: config.clone(),
        })
    }
}

impl ModelClient for CommandModelClient {
    #[instrument(skip_all, fields(program = %self.config.command[0], prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let mut cmd = Command::new(&self.config.command[0]);
        cmd.args(&self.config.command[1..]);
        if !self.config.model.is_empty() {
            cmd.env("GITWISE_MODEL", &self.config.model);
        }
        if !self.config.base_url.is_empty() {
            cmd.env("GITWISE_BASE_URL", &self.config.base_url);
        }

        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )
        .context("run model command")?;

        if output.timed_out {
            return Err(anyhow!(
                "model command timed out after {}s",
                self.config.timeout_secs
            ));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "model command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text().trim()
            ));
        }
        let text = String::from_utf8(output.stdout).context("decode model stdout as UTF-8")?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_bytes = text.len(),
            "model call complete"
        );
        Ok(text)
    }
}

/// Pull the JSON object out of a model reply that may be wrapped in prose or
/// markdown fences.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a model reply as JSON, validate it against `schema`, and deserialize.
pub fn parse_model_json<T: DeserializeOwned>(reply: &str, schema: &str) -> Result<T> {
    let json_text = extract_json(reply);
    let value: Value = serde_json::from_str(json_text).with_context(|| {
        format!(
            "parse model reply as JSON (first 200 chars: {})",
            json_text.chars().take(200).collect::<String>()
        )
    })?;
    let schema_value: Value = serde_json::from_str(schema).context("parse embedded schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(&value) {
        let messages = compiled
            .iter_errors(&value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "model reply failed schema validation: {}",
            messages.join("; ")
        ));
    }
    serde_json::from_value(value).context("deserialize model reply")
}
