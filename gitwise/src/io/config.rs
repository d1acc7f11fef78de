//! Configuration stored as TOML (default `.gitwise/config.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "GITWISE_CONFIG";

/// Top-level configuration.
///
/// Meant to be edited by humans. Missing fields fall back to defaults that run
/// fully offline (no model command configured).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitwiseConfig {
    pub model: ModelConfig,
    pub git: GitConfig,
    pub confirm: ConfirmConfig,
    pub steps: StepsConfig,
}

/// External model used for planning, risk review and commit messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Command reading a prompt on stdin and answering on stdout
    /// (e.g. `["llm", "-m", "gpt-4o-mini"]`). Empty disables the model.
    pub command: Vec<String>,
    /// Exported to the command as `GITWISE_MODEL` when non-empty.
    pub model: String,
    /// Exported to the command as `GITWISE_BASE_URL` when non-empty.
    pub base_url: String,
    /// Environment variable that must hold an API key for the model to be used.
    /// Empty means no key is required.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            model: String::new(),
            base_url: String::new(),
            api_key_env: String::new(),
            timeout_secs: 60,
            output_limit_bytes: 64_000,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Program used for every git invocation.
    pub program: String,
    pub timeout_secs: u64,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout_secs: 120,
            output_limit_bytes: 200_000,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfirmConfig {
    /// Digits of the code a user must retype before a high-risk command.
    pub challenge_code_len: usize,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            challenge_code_len: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StepsConfig {
    /// Remote used when a push has to set an upstream.
    pub remote: String,
    /// `git log --since` value for code statistics.
    pub stats_since: String,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            stats_since: "1 week ago".to_string(),
        }
    }
}

impl GitwiseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git.program.trim().is_empty() {
            return Err(anyhow!("git.program must be non-empty"));
        }
        if self.git.timeout_secs == 0 {
            return Err(anyhow!("git.timeout_secs must be > 0"));
        }
        if self.git.output_limit_bytes == 0 {
            return Err(anyhow!("git.output_limit_bytes must be > 0"));
        }
        if self.model.timeout_secs == 0 {
            return Err(anyhow!("model.timeout_secs must be > 0"));
        }
        if self.model.output_limit_bytes == 0 {
            return Err(anyhow!("model.output_limit_bytes must be > 0"));
        }
        if self
            .model
            .command
            .first()
            .is_some_and(|program| program.trim().is_empty())
        {
            return Err(anyhow!("model.command must start with a program name"));
        }
        if !(4..=12).contains(&self.confirm.challenge_code_len) {
            return Err(anyhow!("confirm.challenge_code_len must be between 4 and 12"));
        }
        if self.steps.remote.trim().is_empty() {
            return Err(anyhow!("steps.remote must be non-empty"));
        }
        if self.steps.stats_since.trim().is_empty() {
            return Err(anyhow!("steps.stats_since must be non-empty"));
        }
        Ok(())
    }
}

/// Default config location inside a repository.
pub fn default_config_path(repo: &Path) -> PathBuf {
    repo.join(".gitwise").join("config.toml")
}

/// Pick the config path: explicit flag, then `GITWISE_CONFIG`, then the repo default.
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<&str>, repo: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => default_config_path(repo),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GitwiseConfig::default()`.
pub fn load_config(path: &Path) -> Result<GitwiseConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = GitwiseConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GitwiseConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GitwiseConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
