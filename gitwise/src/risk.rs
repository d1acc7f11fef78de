//! Risk classifiers for candidate git commands.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::core::risk::classify_local;
use crate::core::types::{RiskAssessment, RiskLevel};
use crate::fallback::Fallback;
use crate::io::model::{ModelClient, parse_model_json};
use crate::io::prompt::PromptEngine;

const RISK_SCHEMA: &str = include_str!("../schemas/risk.schema.json");

pub trait RiskClassifier {
    fn classify(&self, command: &str) -> Result<RiskAssessment>;
}

/// Pattern-table classifier. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRiskClassifier;

impl LocalRiskClassifier {
    pub fn assess(&self, command: &str) -> RiskAssessment {
        classify_local(command)
    }
}

impl RiskClassifier for LocalRiskClassifier {
    fn classify(&self, command: &str) -> Result<RiskAssessment> {
        Ok(self.assess(command))
    }
}

#[derive(Debug, Deserialize)]
struct ModelRiskReply {
    level: RiskLevel,
    description: String,
    #[serde(default)]
    mitigation: Option<String>,
}

/// Model-backed classifier.
///
/// The model may only raise the level: a reply rated below the local pattern
/// policy is lifted to the local level.
pub struct ModelRiskClassifier<M> {
    model: M,
    prompts: PromptEngine,
}

impl<M: ModelClient> ModelRiskClassifier<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompts: PromptEngine::new(),
        }
    }
}

impl<M: ModelClient> RiskClassifier for ModelRiskClassifier<M> {
    fn classify(&self, command: &str) -> Result<RiskAssessment> {
        let prompt = self.prompts.render_risk(command)?;
        let reply = self.model.complete(&prompt)?;
        let parsed: ModelRiskReply = parse_model_json(&reply, RISK_SCHEMA)?;
        let floor = classify_local(command);
        if parsed.level < floor.level {
            debug!(
                model_level = %parsed.level,
                local_level = %floor.level,
                "model rated command below local policy"
            );
            return Ok(floor);
        }
        Ok(RiskAssessment {
            level: parsed.level,
            description: parsed.description,
            mitigation: parsed.mitigation.filter(|m| !m.trim().is_empty()),
        })
    }
}

impl<P: RiskClassifier> RiskClassifier for Fallback<P, LocalRiskClassifier> {
    fn classify(&self, command: &str) -> Result<RiskAssessment> {
        Ok(self.run(
            "risk classification",
            |model| model.classify(command),
            |local| local.assess(command),
        ))
    }
}
